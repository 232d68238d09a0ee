//! Emergency countdown
//!
//! The controller state machine and the display published to clients.

pub mod controller;
pub mod display;

pub use controller::{CountdownController, CountdownOptions};
pub use display::{CountdownView, WatchDisplay};
