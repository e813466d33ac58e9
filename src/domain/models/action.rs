use super::SessionContext;

pub enum Action {
    /// Relay a user turn. The turn number and the session travel with the
    /// request and come back with `Event::TurnFinished`.
    SubmitTurn(u64, SessionContext, String),
    AbortTurn(),
}
