use serde::Serialize;

use chatgraph_types::{Message, User};

/// CSV row types. These map directly to the crawler's file columns and are
/// distinct from chatgraph-types models to keep the file format independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRow {
    pub user_id: String,
    pub username: String,
    pub access_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub group_id: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow {
    pub message_id: String,
    pub from_user_id: String,
    pub reply_to: String,
    pub pinned: String,
    pub message: String,
    pub reactions: String,
}

impl From<&User> for MemberRow {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            username: user.username.clone(),
            access_hash: user.access_hash.map(|h| h.to_string()).unwrap_or_default(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            group_id: user.group_id.to_string(),
            group: user.group.clone(),
        }
    }
}

impl From<&Message> for MessageRow {
    fn from(msg: &Message) -> Self {
        let reactions: Vec<String> = msg.reactions.iter().map(|r| r.to_string()).collect();
        Self {
            message_id: msg.id.to_string(),
            from_user_id: msg.author.map(|a| a.to_string()).unwrap_or_default(),
            reply_to: msg.reply_to.map(|r| r.to_string()).unwrap_or_default(),
            pinned: if msg.pinned { "True" } else { "False" }.to_string(),
            message: msg.text.clone(),
            reactions: reactions.join("-"),
        }
    }
}
