//! API Module
//!
//! HTTP handlers and routing exposing the stash engine.
//!
//! # Endpoints
//! - `GET /state/:key` - Read the state under a key
//! - `PUT /state/:key` - Merge a value into the state under a key
//! - `DELETE /state/:key` - Remove a key
//! - `DELETE /state` - Clear the storage area
//! - `GET /stats` - Engine statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
