use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use serde::Serialize;
use tracing::{info, warn};

use chatgraph_types::{Message, MessageId, User, UserId};

use crate::GroupStore;
use crate::error::{Result, StoreError};
use crate::layout::{MEMBER_COLUMNS, MESSAGE_COLUMNS, resolve_columns};
use crate::models::{MemberRow, MessageRow};
use crate::profile::ProfileImages;

/// Everything loaded for one group.
#[derive(Debug, Clone, Default)]
pub struct Records {
    pub users: BTreeMap<UserId, User>,
    pub messages: BTreeMap<MessageId, Message>,
}

impl GroupStore {
    pub fn load(&self, images: &dyn ProfileImages) -> Result<Records> {
        Ok(Records {
            users: self.load_users(images)?,
            messages: self.load_messages()?,
        })
    }

    // -- Users --

    pub fn load_users(&self, images: &dyn ProfileImages) -> Result<BTreeMap<UserId, User>> {
        let path = self.members_path();
        let mut users = BTreeMap::new();

        for_each_row(&path, &MEMBER_COLUMNS, |cols, record, line| {
            let mut user = parse_member(&path, line, &member_row(cols, record))?;
            user.profile_image = images.lookup(user.id);
            if users.insert(user.id, user).is_some() {
                warn!("{}:{}: duplicate user_id, keeping the later row", path.display(), line);
            }
            Ok(ControlFlow::Continue(()))
        })?;

        let with_pics = users.values().filter(|u| u.profile_image.is_some()).count();
        info!("Loaded {} users ({} with profile pictures) from {}", users.len(), with_pics, path.display());
        Ok(users)
    }

    pub fn write_users<'a>(&self, users: impl IntoIterator<Item = &'a User>) -> Result<()> {
        write_rows(&self.members_path(), users.into_iter().map(MemberRow::from))
    }

    // -- Messages --

    pub fn load_messages(&self) -> Result<BTreeMap<MessageId, Message>> {
        let path = self.messages_path();
        let mut messages = BTreeMap::new();

        for_each_row(&path, &MESSAGE_COLUMNS, |cols, record, line| {
            let msg = parse_message(&path, line, &message_row(cols, record))?;
            if messages.insert(msg.id, msg).is_some() {
                warn!("{}:{}: duplicate message_id, keeping the later row", path.display(), line);
            }
            Ok(ControlFlow::Continue(()))
        })?;

        info!("Loaded {} messages from {}", messages.len(), path.display());
        Ok(messages)
    }

    /// First `limit` messages in file order.
    pub fn preview_messages(&self, limit: usize) -> Result<Vec<Message>> {
        let path = self.messages_path();
        let mut out = Vec::with_capacity(limit);
        if limit == 0 {
            return Ok(out);
        }

        for_each_row(&path, &MESSAGE_COLUMNS, |cols, record, line| {
            out.push(parse_message(&path, line, &message_row(cols, record))?);
            Ok(if out.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })?;

        Ok(out)
    }

    pub fn write_messages<'a>(&self, messages: impl IntoIterator<Item = &'a Message>) -> Result<()> {
        write_rows(&self.messages_path(), messages.into_iter().map(MessageRow::from))
    }
}

fn for_each_row<const N: usize, F>(path: &Path, required: &[&'static str; N], mut f: F) -> Result<()>
where
    F: FnMut(&[usize; N], &StringRecord, u64) -> Result<ControlFlow<()>>,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| StoreError::csv(path, e))?.clone();
    let cols = resolve_columns(path, &headers, required)?;

    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(|e| row_error(path, e))? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if f(&cols, &record, line)?.is_break() {
            break;
        }
    }
    Ok(())
}

/// A record with the wrong number of fields is a malformed row, not a
/// reader failure.
fn row_error(path: &Path, e: csv::Error) -> StoreError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = e.kind()
    {
        return StoreError::MalformedRow {
            file: path.to_path_buf(),
            line: pos.as_ref().map(|p| p.line()).unwrap_or_default(),
            column: "row",
            reason: format!("expected {} fields, found {}", expected_len, len),
        };
    }
    StoreError::csv(path, e)
}

fn write_rows<R: Serialize>(path: &Path, rows: impl Iterator<Item = R>) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn field(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or_default().to_string()
}

fn member_row(cols: &[usize; 7], record: &StringRecord) -> MemberRow {
    MemberRow {
        user_id: field(record, cols[0]),
        username: field(record, cols[1]),
        access_hash: field(record, cols[2]),
        first_name: field(record, cols[3]),
        last_name: field(record, cols[4]),
        group_id: field(record, cols[5]),
        group: field(record, cols[6]),
    }
}

fn message_row(cols: &[usize; 6], record: &StringRecord) -> MessageRow {
    MessageRow {
        message_id: field(record, cols[0]),
        from_user_id: field(record, cols[1]),
        reply_to: field(record, cols[2]),
        pinned: field(record, cols[3]),
        message: field(record, cols[4]),
        reactions: field(record, cols[5]),
    }
}

fn parse_member(file: &Path, line: u64, row: &MemberRow) -> Result<User> {
    let bad = |column: &'static str, reason: String| StoreError::MalformedRow {
        file: file.to_path_buf(),
        line,
        column,
        reason,
    };

    Ok(User {
        id: UserId(parse_int(&row.user_id).map_err(|e| bad("user_id", e))?),
        username: row.username.clone(),
        access_hash: parse_opt_int(&row.access_hash).map_err(|e| bad("access_hash", e))?,
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        group_id: parse_int(&row.group_id).map_err(|e| bad("group_id", e))?,
        group: row.group.clone(),
        profile_image: None,
    })
}

fn parse_message(file: &Path, line: u64, row: &MessageRow) -> Result<Message> {
    let bad = |column: &'static str, reason: String| StoreError::MalformedRow {
        file: file.to_path_buf(),
        line,
        column,
        reason,
    };

    Ok(Message {
        id: MessageId(parse_int(&row.message_id).map_err(|e| bad("message_id", e))?),
        author: parse_opt_int(&row.from_user_id)
            .map_err(|e| bad("from_user_id", e))?
            .map(UserId),
        reply_to: parse_opt_int(&row.reply_to)
            .map_err(|e| bad("reply_to", e))?
            .map(MessageId),
        pinned: parse_bool(&row.pinned).map_err(|e| bad("pinned", e))?,
        text: row.message.clone(),
        reactions: parse_reactions(&row.reactions).map_err(|e| bad("reactions", e))?,
    })
}

/// Integer cell. Accepts a trailing `.0` left behind by float-typed columns.
pub(crate) fn parse_int(raw: &str) -> std::result::Result<i64, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("value is required".into());
    }
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.parse::<i64>().map_err(|e| format!("{:?}: {}", raw, e))
}

pub(crate) fn parse_opt_int(raw: &str) -> std::result::Result<Option<i64>, String> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse_int(raw).map(Some)
    }
}

pub(crate) fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        "" => Err("value is required".into()),
        _ => Err(format!("{:?} is not a boolean", raw)),
    }
}

/// Hyphen-joined user ids, e.g. `12-345-6789`.
pub(crate) fn parse_reactions(raw: &str) -> std::result::Result<BTreeSet<UserId>, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(BTreeSet::new());
    }
    s.split('-').map(|part| parse_int(part).map(UserId)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{NoProfileImages, ProfileDir};

    const MEMBERS: &str = "\
user_id,username,access_hash,first_name,last_name,group_id,group
1,alice,111,Alice,A,500,Test Group
2,,,Bob,,500,Test Group
3,carol,333,Carol,C,500,Test Group
";

    const MESSAGES: &str = "\
message_id,from_user_id,reply_to,pinned,message,reactions
10,1,,False,hello,2-3
11,2,10,True,\"hi, alice\",
12,,,False,channel post,
13,3,999.0,false,late reply,1
";

    fn store_with(members: &str, messages: &str) -> (tempfile::TempDir, GroupStore) {
        let root = tempfile::tempdir().unwrap();
        let store = GroupStore::create(root.path(), 500).unwrap();
        std::fs::write(store.members_path(), members).unwrap();
        std::fs::write(store.messages_path(), messages).unwrap();
        (root, store)
    }

    #[test]
    fn loads_users_and_messages() {
        let (_root, store) = store_with(MEMBERS, MESSAGES);
        let records = store.load(&NoProfileImages).unwrap();

        assert_eq!(records.users.len(), 3);
        let bob = &records.users[&UserId(2)];
        assert_eq!(bob.username, "");
        assert_eq!(bob.access_hash, None);
        assert_eq!(bob.group, "Test Group");

        assert_eq!(records.messages.len(), 4);
        let first = &records.messages[&MessageId(10)];
        assert_eq!(first.author, Some(UserId(1)));
        assert_eq!(first.reactions, [UserId(2), UserId(3)].into_iter().collect());

        let reply = &records.messages[&MessageId(11)];
        assert_eq!(reply.reply_to, Some(MessageId(10)));
        assert!(reply.pinned);
        assert_eq!(reply.text, "hi, alice");
        assert!(reply.reactions.is_empty());

        assert_eq!(records.messages[&MessageId(12)].author, None);
        assert_eq!(records.messages[&MessageId(13)].reply_to, Some(MessageId(999)));
    }

    #[test]
    fn attaches_profile_pictures() {
        let (root, store) = store_with(MEMBERS, MESSAGES);
        let pics = root.path().join("profile_pics");
        std::fs::create_dir_all(&pics).unwrap();
        std::fs::write(pics.join("3.jpg"), b"jpeg").unwrap();

        let users = store.load_users(&ProfileDir::new(&pics)).unwrap();
        assert_eq!(users[&UserId(3)].profile_image, Some(pics.join("3.jpg")));
        assert_eq!(users[&UserId(1)].profile_image, None);
    }

    #[test]
    fn missing_column_fails_before_rows() {
        let (_root, store) = store_with(MEMBERS, "message_id,from_user_id,pinned\n1,2,False\n");
        let err = store.load_messages().unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { column: "reply_to", .. }));
    }

    #[test]
    fn malformed_row_reports_line_and_column() {
        let bad = "\
message_id,from_user_id,reply_to,pinned,message,reactions
10,1,,False,ok,
11,abc,,False,broken,
";
        let (_root, store) = store_with(MEMBERS, bad);
        match store.load_messages().unwrap_err() {
            StoreError::MalformedRow { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "from_user_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_row_is_malformed() {
        let short = "\
message_id,from_user_id,reply_to,pinned,message,reactions
10,1,,False
";
        let (_root, store) = store_with(MEMBERS, short);
        match store.load_messages().unwrap_err() {
            StoreError::MalformedRow { line, column, reason, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "row");
                assert_eq!(reason, "expected 6 fields, found 4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_member_group_id_is_named() {
        let bad = "\
user_id,username,access_hash,first_name,last_name,group_id,group
1,alice,111,Alice,A,500,Test Group
2,bob,,Bob,,abc,Test Group
";
        let (_root, store) = store_with(bad, MESSAGES);
        match store.load_users(&NoProfileImages).unwrap_err() {
            StoreError::MalformedRow { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "group_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_reaction_list_is_rejected() {
        let bad = "\
message_id,from_user_id,reply_to,pinned,message,reactions
10,1,,False,ok,2--3
";
        let (_root, store) = store_with(MEMBERS, bad);
        let err = store.load_messages().unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { column: "reactions", .. }));
    }

    #[test]
    fn duplicate_ids_keep_later_row() {
        let dup = "\
message_id,from_user_id,reply_to,pinned,message,reactions
10,1,,False,first,
10,2,,False,second,
";
        let (_root, store) = store_with(MEMBERS, dup);
        let messages = store.load_messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[&MessageId(10)].text, "second");
    }

    #[test]
    fn preview_stops_at_limit() {
        let (_root, store) = store_with(MEMBERS, MESSAGES);
        let head = store.preview_messages(2).unwrap();
        let ids: Vec<_> = head.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![MessageId(10), MessageId(11)]);
        assert!(store.preview_messages(0).unwrap().is_empty());
    }

    #[test]
    fn written_files_load_back() {
        let (_root, store) = store_with(MEMBERS, MESSAGES);
        let records = store.load(&NoProfileImages).unwrap();

        let copy_root = tempfile::tempdir().unwrap();
        let copy = GroupStore::create(copy_root.path(), 500).unwrap();
        copy.write_users(records.users.values()).unwrap();
        copy.write_messages(records.messages.values()).unwrap();

        let text = std::fs::read_to_string(copy.messages_path()).unwrap();
        assert!(text.starts_with("message_id,from_user_id,reply_to,pinned,message,reactions\n"));
        assert!(text.contains("10,1,,False,hello,2-3\n"));

        let reloaded = copy.load(&NoProfileImages).unwrap();
        assert_eq!(reloaded.users, records.users);
        assert_eq!(reloaded.messages, records.messages);
    }

    #[test]
    fn cell_parsers() {
        assert_eq!(parse_int(" 42 "), Ok(42));
        assert_eq!(parse_int("1952093821.0"), Ok(1952093821));
        assert!(parse_int("").is_err());
        assert!(parse_int("4.5").is_err());

        assert_eq!(parse_opt_int(""), Ok(None));
        assert_eq!(parse_bool("True"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("yes").is_err());

        assert!(parse_reactions("").unwrap().is_empty());
        assert_eq!(parse_reactions("5-5-6").unwrap().len(), 2);
    }
}
