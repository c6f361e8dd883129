use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::{Result, StoreError};

pub const MEMBERS_FILE: &str = "members.csv";
pub const MESSAGES_FILE: &str = "messages.csv";
pub const PROFILE_PICS_DIR: &str = "profile_pics";

pub const MEMBER_COLUMNS: [&str; 7] = [
    "user_id",
    "username",
    "access_hash",
    "first_name",
    "last_name",
    "group_id",
    "group",
];

pub const MESSAGE_COLUMNS: [&str; 6] = [
    "message_id",
    "from_user_id",
    "reply_to",
    "pinned",
    "message",
    "reactions",
];

/// `<root>/group-<id>`
pub fn group_dir(root: &Path, group_id: i64) -> PathBuf {
    root.join(format!("group-{}", group_id))
}

pub fn profile_pics_dir(root: &Path) -> PathBuf {
    root.join(PROFILE_PICS_DIR)
}

/// Column positions for a header row, in the order of `required`.
///
/// Extra columns are allowed; a missing one is an error.
pub(crate) fn resolve_columns<const N: usize>(
    file: &Path,
    headers: &StringRecord,
    required: &[&'static str; N],
) -> Result<[usize; N]> {
    let mut positions = [0usize; N];
    for (slot, column) in positions.iter_mut().zip(required.iter()) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == *column)
            .ok_or_else(|| StoreError::MissingColumn {
                file: file.to_path_buf(),
                column: *column,
            })?;
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_dir_naming() {
        let dir = group_dir(Path::new("database"), 1952093821);
        assert_eq!(dir, PathBuf::from("database/group-1952093821"));
    }

    #[test]
    fn columns_resolve_in_any_order() {
        let headers = StringRecord::from(vec!["reactions", "message_id", "extra", "pinned"]);
        let pos = resolve_columns(Path::new("m.csv"), &headers, &["message_id", "pinned", "reactions"])
            .unwrap();
        assert_eq!(pos, [1, 3, 0]);
    }

    #[test]
    fn missing_column_is_named() {
        let headers = StringRecord::from(vec!["message_id"]);
        let err = resolve_columns(Path::new("m.csv"), &headers, &["message_id", "pinned"]).unwrap_err();
        match err {
            StoreError::MissingColumn { column, .. } => assert_eq!(column, "pinned"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
