use std::path::PathBuf;

use chatgraph_types::UserId;

/// Resolves a user's profile picture, if one was downloaded.
pub trait ProfileImages {
    fn lookup(&self, user: UserId) -> Option<PathBuf>;
}

/// Pictures stored as `<dir>/<user_id>.jpg`.
#[derive(Debug, Clone)]
pub struct ProfileDir {
    dir: PathBuf,
}

impl ProfileDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ProfileImages for ProfileDir {
    fn lookup(&self, user: UserId) -> Option<PathBuf> {
        let path = self.dir.join(format!("{}.jpg", user));
        path.is_file().then_some(path)
    }
}

/// Never finds a picture.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfileImages;

impl ProfileImages for NoProfileImages {
    fn lookup(&self, _user: UserId) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_existing_jpg_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("7.jpg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("8.png"), b"png").unwrap();

        let pics = ProfileDir::new(dir.path());
        assert_eq!(pics.lookup(UserId(7)), Some(dir.path().join("7.jpg")));
        assert_eq!(pics.lookup(UserId(8)), None);
        assert_eq!(NoProfileImages.lookup(UserId(7)), None);
    }
}
