#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::BubbleList;
use super::Scroll;
use crate::domain::models::Action;
use crate::domain::models::Author;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::SessionContext;
use crate::domain::models::SlashCommand;
use crate::domain::models::TurnOutcome;

/// What the chat screen shows. The session is owned here between turns and
/// lent to the actions worker while a turn is in flight.
pub struct AppState {
    pub bubble_list: BubbleList,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub messages: Vec<Message>,
    pub scroll: Scroll,
    pub session: SessionContext,
    pub title: String,
    /// Number of the latest submitted turn. Only its outcome is accepted.
    pub turn: u64,
    pub waiting_for_backend: bool,
}

impl AppState {
    pub fn new(session: SessionContext, title: &str, notice: Option<String>) -> AppState {
        let mut app_state = AppState {
            bubble_list: BubbleList::default(),
            last_known_height: 0,
            last_known_width: 0,
            messages: session.transcript.clone(),
            scroll: Scroll::default(),
            session,
            title: title.to_string(),
            turn: 0,
            waiting_for_backend: false,
        };

        if let Some(notice) = notice {
            app_state.messages.push(Message::new_with_type(
                Author::Muesli,
                MessageType::Error,
                &notice,
            ));
        }

        return app_state;
    }

    /// Returns `(should_break, should_continue)` for the input loop.
    pub fn handle_slash_commands(&mut self, input_str: &str) -> Result<(bool, bool)> {
        let command = match SlashCommand::parse(input_str) {
            Some(command) => command,
            None => return Ok((false, false)),
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_clear() {
            self.clear_session();
            return Ok((false, true));
        }

        if command.is_help() {
            self.add_message(Message::new(Author::Muesli, &help_text()));
            return Ok((false, true));
        }

        return Ok((false, false));
    }

    /// Shows the user's message and hands the turn to the actions worker.
    pub fn submit(&mut self, text: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        self.add_message(Message::new(Author::User, text));
        self.waiting_for_backend = true;
        self.turn += 1;
        tx.send(Action::SubmitTurn(
            self.turn,
            self.session.clone(),
            text.to_string(),
        ))?;

        return Ok(());
    }

    pub fn handle_turn_finished(&mut self, outcome: TurnOutcome) {
        if !self.waiting_for_backend || outcome.turn != self.turn {
            tracing::debug!(
                turn = outcome.turn,
                current = self.turn,
                "Dropping the outcome of an aborted turn"
            );
            return;
        }

        self.waiting_for_backend = false;
        self.session = outcome.session;

        match outcome.reply {
            Ok(reply) => {
                self.add_message(Message::new(Author::Assistant, &reply));
            }
            Err(err) => {
                self.add_message(Message::new_with_type(
                    Author::Muesli,
                    MessageType::Error,
                    &err.to_string(),
                ));
            }
        }
    }

    /// Stops waiting on the current turn. The session stays as it was before
    /// the turn was submitted.
    pub fn abort_turn(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if !self.waiting_for_backend {
            return Ok(());
        }

        tx.send(Action::AbortTurn())?;
        self.waiting_for_backend = false;
        self.add_message(Message::new_with_type(
            Author::Muesli,
            MessageType::Error,
            "Stopped waiting for the assistant.",
        ));

        return Ok(());
    }

    pub fn clear_session(&mut self) {
        self.session.reset();
        self.messages = self.session.transcript.clone();
        self.sync_dependants();
        self.scroll.first();
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.sync_dependants();
        self.scroll.last();
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.messages, self.last_known_width);

        self.scroll.set_state(
            u16::try_from(self.bubble_list.len()).unwrap_or(u16::MAX),
            self.last_known_height,
        );

        if self.waiting_for_backend {
            self.scroll.last();
        }
    }
}
