//! API request handlers.

mod events;
mod health;
mod jobs;
mod upload;

pub use events::*;
pub use health::*;
pub use jobs::*;
pub use upload::*;
