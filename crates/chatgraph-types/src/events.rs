use serde::{Deserialize, Serialize};

use crate::models::{MessageId, UserId};

/// One unit of interaction between two users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InteractionEvent {
    /// `from` replied to a message written by `to`
    Reply {
        from: UserId,
        to: UserId,
        message: MessageId,
    },

    /// `from` reacted to a message written by `to`
    Reaction {
        from: UserId,
        to: UserId,
        message: MessageId,
    },
}

impl InteractionEvent {
    pub fn endpoints(&self) -> (UserId, UserId) {
        match *self {
            InteractionEvent::Reply { from, to, .. } | InteractionEvent::Reaction { from, to, .. } => {
                (from, to)
            }
        }
    }

    pub fn message(&self) -> MessageId {
        match *self {
            InteractionEvent::Reply { message, .. } | InteractionEvent::Reaction { message, .. } => {
                message
            }
        }
    }

    pub fn is_self_loop(&self) -> bool {
        let (from, to) = self.endpoints();
        from == to
    }
}
