//! Background Tasks Module
//!
//! Contains the tasks the engine spawns on the runtime.
//!
//! # Tasks
//! - Expiry timers: erase a key once its cache time has elapsed
//! - Change listeners: forward storage events to application callbacks

mod expiry;
mod notifier;

pub use expiry::{ExpiryScheduler, TimerHandle};
pub use notifier::{ChangeNotifier, Subscription};
