#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ConversationDriver;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::TurnOutcome;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /clear (/cl) - Forgets the current conversation and starts over. You stay logged in.
- /quit /exit (/q) - Exit Muesli.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+L - Clear the conversation, same as /clear.
- CTRL+C - Stop waiting for the assistant if a reply is in progress, otherwise exit.
        "#;

    return text.trim().to_string();
}

/// Stops the running turn, if any, and cancels the remote run it left
/// behind.
async fn stop_worker(worker: &mut Option<JoinHandle<Result<()>>>, driver: &ConversationDriver) {
    if let Some(handle) = worker.take() {
        handle.abort();
        if let Ok(Err(err)) = handle.await {
            tracing::warn!(error = ?err, "Turn worker failed");
        }
    }

    driver.cancel_active_run().await;
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs turns on a background worker, one at a time, until the action
    /// channel closes.
    pub async fn start(
        driver: ConversationDriver,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let driver = Arc::new(driver);

        let mut worker: Option<JoinHandle<Result<()>>> = None;

        while let Some(action) = rx.recv().await {
            match action {
                Action::AbortTurn() => {
                    tracing::debug!("Aborting turn");
                    stop_worker(&mut worker, &driver).await;
                }
                Action::SubmitTurn(turn, mut session, text) => {
                    stop_worker(&mut worker, &driver).await;

                    let worker_driver = driver.clone();
                    let worker_tx = tx.clone();
                    worker = Some(tokio::spawn(async move {
                        let reply = worker_driver.send(&mut session, &text).await;
                        match &reply {
                            Err(err) if err.is_transport() => {
                                tracing::error!(error = %err, "Assistant service request failed");
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "Turn failed");
                            }
                            Ok(_) => {}
                        }

                        worker_tx.send(Event::TurnFinished(TurnOutcome {
                            turn,
                            session,
                            reply,
                        }))?;

                        return Ok(());
                    }));
                }
            }
        }

        stop_worker(&mut worker, &driver).await;

        return Ok(());
    }
}
