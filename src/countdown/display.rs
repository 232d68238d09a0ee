//! Countdown view published to API clients

use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::services::{CountdownDisplay, Screen};

/// What a client rendering the countdown should show
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownView {
    pub screen_open: bool,
    pub visible: bool,
    pub animating: bool,
    pub total_millis: u64,
    pub remaining_millis: u64,
}

/// Display and screen backed by a watch channel
#[derive(Debug, Clone)]
pub struct WatchDisplay {
    view_tx: watch::Sender<CountdownView>,
}

impl WatchDisplay {
    pub fn new(view_tx: watch::Sender<CountdownView>) -> Self {
        Self { view_tx }
    }

    /// Mark the screen as opened for a new countdown
    pub fn open(&self) {
        self.view_tx.send_modify(|view| {
            *view = CountdownView {
                screen_open: true,
                ..CountdownView::default()
            };
        });
    }

    /// Close the screen unless the countdown already closed it
    pub fn close_if_open(&self) {
        if self.view_tx.borrow().screen_open {
            self.close();
        }
    }
}

impl CountdownDisplay for WatchDisplay {
    fn start(&self, total: Duration) {
        self.view_tx.send_modify(|view| {
            view.animating = true;
            view.total_millis = total.as_millis() as u64;
            view.remaining_millis = view.total_millis;
        });
    }

    fn set_remaining(&self, remaining: Duration) {
        debug!("Display remaining: {}ms", remaining.as_millis());
        self.view_tx.send_modify(|view| view.remaining_millis = remaining.as_millis() as u64);
    }

    fn show(&self) {
        self.view_tx.send_modify(|view| view.visible = true);
    }

    fn stop(&self) {
        self.view_tx.send_modify(|view| view.animating = false);
    }
}

impl Screen for WatchDisplay {
    fn close(&self) {
        info!("Closing emergency countdown screen");
        self.view_tx.send_modify(|view| {
            view.screen_open = false;
            view.visible = false;
            view.animating = false;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_follows_display_calls() {
        let (tx, rx) = watch::channel(CountdownView::default());
        let display = WatchDisplay::new(tx);

        display.open();
        display.start(Duration::from_secs(5));
        display.show();
        display.set_remaining(Duration::from_secs(3));
        assert_eq!(
            *rx.borrow(),
            CountdownView {
                screen_open: true,
                visible: true,
                animating: true,
                total_millis: 5000,
                remaining_millis: 3000,
            }
        );

        display.close();
        let view = rx.borrow().clone();
        assert!(!view.screen_open);
        assert!(!view.visible);
        assert_eq!(view.remaining_millis, 3000);
    }
}
