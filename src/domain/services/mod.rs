pub mod actions;
mod app_state;
mod auth;
mod bubble_list;
mod conversation;
pub mod events;
mod scroll;

pub use app_state::*;
pub use auth::*;
pub use bubble_list::*;
pub use conversation::*;
pub use scroll::*;
