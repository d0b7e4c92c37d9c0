//! File search paths.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable with extra search directories, in the platform's
/// path-list syntax.
pub const FILE_PATH_ENV: &str = "IVE_FILE_PATH";

/// Ordered list of directories searched for relative file names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilePathList {
    paths: Vec<PathBuf>,
}

impl FilePathList {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// The given directories followed by those in `IVE_FILE_PATH`.
    pub fn with_env(mut paths: Vec<PathBuf>) -> Self {
        if let Some(extra) = env::var_os(FILE_PATH_ENV) {
            paths.extend(env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
        }
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Locate a file. Absolute names and names that exist relative to the
    /// working directory win; then each directory is tried in order, first
    /// with the name as given and then with its bare file name.
    pub fn find(&self, name: impl AsRef<Path>) -> Option<PathBuf> {
        let name = name.as_ref();
        if name.as_os_str().is_empty() {
            return None;
        }
        if name.is_absolute() || name.is_file() {
            return name.is_file().then(|| name.to_path_buf());
        }
        let bare = name.file_name().map(Path::new);
        for dir in &self.paths {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            if let Some(bare) = bare.filter(|b| *b != name) {
                let candidate = dir.join(bare);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_in_search_dirs() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(b.path().join("tex.png"), b"x").unwrap();

        let list = FilePathList::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        assert_eq!(list.find("tex.png"), Some(b.path().join("tex.png")));
        assert_eq!(list.find("textures/tex.png"), Some(b.path().join("tex.png")));
        assert_eq!(list.find("missing.png"), None);
        assert_eq!(list.find(""), None);
    }

    #[test]
    fn test_absolute_names() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("model.ive");
        fs::write(&file, b"x").unwrap();
        let list = FilePathList::default();
        assert_eq!(list.find(&file), Some(file.clone()));
        assert_eq!(list.find(dir.path().join("nope.ive")), None);
    }
}
