//! Countdown timer background task
//!
//! Each countdown runs as one task owning its controller. Ticks and commands
//! are handled by a single `select!` loop, so tick, cancel and finish can
//! never interleave.

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    countdown::CountdownController,
    state::{CountdownPhase, CountdownStatus, SavedCountdown},
};

/// Commands accepted by a running countdown
#[derive(Debug)]
pub enum CountdownCommand {
    SlideComplete,
    Cancel,
    Save(oneshot::Sender<SavedCountdown>),
    Stop(oneshot::Sender<SavedCountdown>),
}

/// Handle to a spawned countdown task
#[derive(Debug)]
pub struct CountdownSession {
    commands: mpsc::UnboundedSender<CountdownCommand>,
    task: JoinHandle<CountdownPhase>,
}

impl CountdownSession {
    /// Spawn a countdown starting from `saved`
    pub fn spawn(
        controller: CountdownController,
        saved: SavedCountdown,
        status_tx: watch::Sender<CountdownStatus>,
    ) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(countdown_timer_task(controller, saved, commands_rx, status_tx));
        Self { commands, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn slide_complete(&self) -> Result<(), String> {
        self.send(CountdownCommand::SlideComplete)
    }

    pub fn cancel(&self) -> Result<(), String> {
        self.send(CountdownCommand::Cancel)
    }

    /// Current remaining time without disturbing the countdown
    pub async fn save(&self) -> Result<SavedCountdown, String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CountdownCommand::Save(reply_tx))?;
        reply_rx.await.map_err(|_| "Countdown ended before saving".to_string())
    }

    /// Tear the countdown down and return what was left of it
    pub async fn stop(self) -> Result<(SavedCountdown, CountdownPhase), String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let sent = self.send(CountdownCommand::Stop(reply_tx));
        let saved = match sent {
            Ok(()) => reply_rx.await.ok(),
            Err(_) => None,
        };
        let phase = self.join().await?;
        Ok((saved.unwrap_or(SavedCountdown { remaining_millis: 0 }), phase))
    }

    /// Wait for the countdown to end
    pub async fn join(self) -> Result<CountdownPhase, String> {
        self.task
            .await
            .map_err(|e| format!("Countdown task failed: {}", e))
    }

    fn send(&self, command: CountdownCommand) -> Result<(), String> {
        self.commands
            .send(command)
            .map_err(|_| "Countdown is no longer running".to_string())
    }
}

/// Drive `controller` from `saved` until it finishes, is cancelled or is stopped
pub async fn countdown_timer_task(
    mut controller: CountdownController,
    saved: SavedCountdown,
    mut commands: mpsc::UnboundedReceiver<CountdownCommand>,
    status_tx: watch::Sender<CountdownStatus>,
) -> CountdownPhase {
    let publish = |controller: &CountdownController| {
        status_tx.send_replace(CountdownStatus::new(controller.phase(), controller.remaining()));
    };

    if !controller.start(saved.remaining()) {
        publish(&controller);
        return controller.phase();
    }
    publish(&controller);

    let mut deadline = Instant::now() + controller.next_delay();
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => {
                let next = controller.remaining().saturating_sub(controller.tick_interval());
                controller.on_tick(next);
                publish(&controller);
                if controller.is_terminal() {
                    break;
                }
                deadline += controller.next_delay();
            }

            command = commands.recv() => {
                match command {
                    Some(CountdownCommand::SlideComplete) => {
                        controller.slide_complete();
                    }
                    Some(CountdownCommand::Cancel) => {
                        controller.cancel();
                    }
                    Some(CountdownCommand::Save(reply)) => {
                        if reply.send(controller.save()).is_err() {
                            debug!("Save requester went away");
                        }
                    }
                    Some(CountdownCommand::Stop(reply)) => {
                        let saved = controller.stop();
                        publish(&controller);
                        if reply.send(saved).is_err() {
                            debug!("Stop requester went away");
                        }
                        break;
                    }
                    None => {
                        warn!("Countdown handle dropped, stopping countdown");
                        controller.stop();
                        publish(&controller);
                        break;
                    }
                }
                publish(&controller);
                if controller.is_terminal() {
                    break;
                }
            }
        }
    }

    info!("Countdown task ended in phase {:?}", controller.phase());
    controller.phase()
}
