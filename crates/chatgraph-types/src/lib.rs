pub mod events;
pub mod models;
pub mod report;

pub use events::InteractionEvent;
pub use models::{Message, MessageId, User, UserId};
