//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod countdown_timer;
pub mod signal_dispatch;

// Re-export main functions
pub use countdown_timer::{countdown_timer_task, CountdownCommand, CountdownSession};
pub use signal_dispatch::signal_dispatch_task;
