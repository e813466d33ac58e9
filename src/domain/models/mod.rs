mod action;
mod assistant;
mod author;
mod bubble;
mod credentials;
mod error;
mod event;
mod loading;
mod message;
mod poll;
mod session;
mod slash_commands;
mod textarea;

pub use action::*;
pub use assistant::*;
pub use author::*;
pub use bubble::*;
pub use credentials::*;
pub use error::*;
pub use event::*;
pub use loading::*;
pub use message::*;
pub use poll::*;
pub use session::*;
pub use slash_commands::*;
pub use textarea::*;
