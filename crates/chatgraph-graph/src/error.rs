use thiserror::Error;

use chatgraph_types::{MessageId, UserId};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("message {message} references unknown user {user}")]
    UnknownUser { user: UserId, message: MessageId },
}

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("xmin must be at least 1, got {0}")]
    InvalidXmin(u64),

    #[error("need at least {needed} observations at or above xmin {xmin}, have {have}")]
    InsufficientData { xmin: u64, needed: usize, have: usize },

    #[error("KS distance is not finite for xmin {xmin} (alpha {alpha})")]
    NonFinite { xmin: u64, alpha: f64 },
}

pub type Result<T> = std::result::Result<T, GraphError>;
