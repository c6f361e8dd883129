use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::info;

use crate::GroupStore;
use crate::error::{Result, StoreError};
use crate::layout::{MESSAGE_COLUMNS, resolve_columns};

/// Append every message row of `legacy` to `target`'s messages file.
///
/// Used when a group was migrated and its old history lives under the
/// previous group id. Both files must carry the same header. Returns the
/// number of rows appended.
pub fn merge_legacy(legacy: &GroupStore, target: &GroupStore) -> Result<usize> {
    let legacy_path = legacy.messages_path();
    let target_path = target.messages_path();

    let target_headers = {
        let mut reader = ReaderBuilder::new()
            .from_path(&target_path)
            .map_err(|e| StoreError::csv(&target_path, e))?;
        reader.headers().map_err(|e| StoreError::csv(&target_path, e))?.clone()
    };
    resolve_columns(&target_path, &target_headers, &MESSAGE_COLUMNS)?;

    let mut reader = ReaderBuilder::new()
        .from_path(&legacy_path)
        .map_err(|e| StoreError::csv(&legacy_path, e))?;
    let legacy_headers = reader.headers().map_err(|e| StoreError::csv(&legacy_path, e))?.clone();
    if !legacy_headers.iter().eq(target_headers.iter()) {
        return Err(StoreError::HeaderMismatch {
            legacy: legacy_path,
            target: target_path,
        });
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(&target_path)
        .map_err(|e| StoreError::io(&target_path, e))?;
    if !ends_with_newline(&target_path).map_err(|e| StoreError::io(&target_path, e))? {
        file.write_all(b"\n").map_err(|e| StoreError::io(&target_path, e))?;
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);

    let mut appended = 0;
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(|e| StoreError::csv(&legacy_path, e))? {
        writer.write_record(&record).map_err(|e| StoreError::csv(&target_path, e))?;
        appended += 1;
    }
    writer.flush().map_err(|e| StoreError::io(&target_path, e))?;

    info!(
        "Merged {} messages from group {} into group {}",
        appended,
        legacy.group_id(),
        target.group_id()
    );
    Ok(appended)
}

/// True for an empty file too.
fn ends_with_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
