use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform user id. Ids are 64-bit on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Message id, unique within one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UserId)
    }
}

impl FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(MessageId)
    }
}

/// A group member as captured by one membership snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub access_hash: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub group_id: i64,
    pub group: String,
    /// Resolved by the record store; never read by graph code.
    pub profile_image: Option<PathBuf>,
}

impl User {
    /// Handle if set, otherwise "first last", otherwise the numeric id.
    pub fn display_name(&self) -> String {
        if !self.username.is_empty() {
            return self.username.clone();
        }
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.id.to_string()
        } else {
            full.to_string()
        }
    }
}

/// A message from a group history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// `None` for posts made on behalf of the group itself.
    pub author: Option<UserId>,
    /// May point outside the loaded history.
    pub reply_to: Option<MessageId>,
    pub pinned: bool,
    pub text: String,
    pub reactions: BTreeSet<UserId>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let author = self.author.map(|a| a.to_string()).unwrap_or_default();
        let reply_to = self.reply_to.map(|r| r.to_string()).unwrap_or_default();
        let reactions: Vec<String> = self.reactions.iter().map(|r| r.to_string()).collect();
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.id,
            author,
            reply_to,
            self.pinned,
            self.text,
            reactions.join("-")
        )
    }
}
