pub mod error;
pub mod layout;
pub mod merge;
pub mod models;
pub mod profile;
pub mod records;

use std::path::{Path, PathBuf};

use tracing::info;

pub use error::{Result, StoreError};
pub use merge::merge_legacy;
pub use profile::{NoProfileImages, ProfileDir, ProfileImages};
pub use records::Records;

/// One group's crawl output: `<root>/group-<id>/{members,messages}.csv`.
#[derive(Debug, Clone)]
pub struct GroupStore {
    group_id: i64,
    dir: PathBuf,
}

impl GroupStore {
    pub fn open(root: &Path, group_id: i64) -> Result<Self> {
        let dir = layout::group_dir(root, group_id);
        if !dir.is_dir() {
            return Err(StoreError::GroupNotFound(dir));
        }

        info!("Group store opened at {}", dir.display());
        Ok(Self { group_id, dir })
    }

    /// Like `open`, creating the group directory first.
    pub fn create(root: &Path, group_id: i64) -> Result<Self> {
        let dir = layout::group_dir(root, group_id);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Self::open(root, group_id)
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn members_path(&self) -> PathBuf {
        self.dir.join(layout::MEMBERS_FILE)
    }

    pub fn messages_path(&self) -> PathBuf {
        self.dir.join(layout::MESSAGES_FILE)
    }
}
