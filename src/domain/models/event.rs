use tui_textarea::Input;

use super::ChatError;
use super::SessionContext;

pub struct TurnOutcome {
    pub turn: u64,
    pub session: SessionContext,
    pub reply: Result<String, ChatError>,
}

pub enum Event {
    TurnFinished(TurnOutcome),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLL(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}
