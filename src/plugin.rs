//! File-level entry points for `.ive` files.
//!
//! [`ReaderWriter`] is the seam a host uses to read and write scene files by
//! extension; [`ReaderWriterIve`] implements it for `.ive`. Every entry point
//! either returns a complete graph or an error, never a partial graph.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::scene::{ImageRef, NodeRef, UserData};
use crate::stream::{DataInputStream, DataOutputStream, ReadOptions, WriteOptions, MAX_EXTERNAL_DEPTH};
use crate::util::{Error, Result};

/// Reads and writes scene files of one or more formats.
pub trait ReaderWriter: Send + Sync {
    fn name(&self) -> &str;

    fn accepts_extension(&self, ext: &str) -> bool;

    fn read_node(&self, path: &Path, options: &ReadOptions) -> Result<NodeRef>;
    fn read_object(&self, path: &Path, options: &ReadOptions) -> Result<Option<UserData>>;
    fn read_image(&self, path: &Path, options: &ReadOptions) -> Result<ImageRef>;

    fn read_node_from(&self, reader: &mut dyn Read, options: &ReadOptions) -> Result<NodeRef>;
    fn read_object_from(&self, reader: &mut dyn Read, options: &ReadOptions) -> Result<Option<UserData>>;
    fn read_image_from(&self, reader: &mut dyn Read, options: &ReadOptions) -> Result<ImageRef>;

    fn write_node(&self, node: &NodeRef, path: &Path, options: &WriteOptions) -> Result<()>;
    fn write_object(&self, object: &UserData, path: &Path, options: &WriteOptions) -> Result<()>;
    fn write_image(&self, image: &ImageRef, path: &Path, options: &WriteOptions) -> Result<()>;

    fn write_node_to(&self, node: &NodeRef, writer: &mut dyn Write, options: &WriteOptions) -> Result<()>;
    fn write_object_to(&self, object: &UserData, writer: &mut dyn Write, options: &WriteOptions) -> Result<()>;
    fn write_image_to(&self, image: &ImageRef, writer: &mut dyn Write, options: &WriteOptions) -> Result<()>;
}

/// The `.ive` reader/writer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReaderWriterIve;

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.parent().filter(|p| !p.as_os_str().is_empty()).map(Path::to_path_buf)
}

impl ReaderWriterIve {
    fn check_extension(&self, path: &Path) -> Result<()> {
        let ext = extension(path);
        if self.accepts_extension(&ext) {
            Ok(())
        } else {
            Err(Error::FileNotHandled(path.display().to_string()))
        }
    }

    /// Map a file and run `f` over a stream on it. The file's directory is
    /// searched first for anything the file refers to.
    fn with_file<T>(
        &self,
        path: &Path,
        options: &ReadOptions,
        f: impl FnOnce(&mut DataInputStream<&[u8]>) -> Result<T>,
    ) -> Result<T> {
        self.check_extension(path)?;
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(Error::UnexpectedEof(0));
        }
        // Safety: the map is read-only and dropped before this returns.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;

        let mut options = options.clone();
        if let Some(dir) = parent_dir(path) {
            options.database_paths.insert(0, dir);
        }
        let mut stream = DataInputStream::new(&mmap[..], options)?;
        debug!(path = %path.display(), size, version = stream.version(), "reading IVE file");
        f(&mut stream)
    }

    /// Write through a temporary file next to `path`, moved into place only
    /// once the whole stream is written. A failed write leaves `path` as it was.
    fn create_file<T>(
        &self,
        path: &Path,
        options: &WriteOptions,
        f: impl FnOnce(&mut DataOutputStream<BufWriter<NamedTempFile>>) -> Result<T>,
    ) -> Result<T> {
        self.check_extension(path)?;
        let mut options = options.clone();
        let dir = parent_dir(path);
        if let Some(dir) = &dir {
            options.database_paths.insert(0, dir.clone());
        }
        let tmp = NamedTempFile::new_in(dir.unwrap_or_else(|| PathBuf::from(".")))?;
        let mut stream = DataOutputStream::new(BufWriter::new(tmp), options)?;
        let value = f(&mut stream)?;
        let tmp = stream.finish()?.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        info!(path = %path.display(), "wrote IVE file");
        Ok(value)
    }
}

impl ReaderWriter for ReaderWriterIve {
    fn name(&self) -> &str {
        "IVE Reader/Writer"
    }

    fn accepts_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("ive")
    }

    fn read_node(&self, path: &Path, options: &ReadOptions) -> Result<NodeRef> {
        self.with_file(path, options, |s| s.read_node())
    }

    fn read_object(&self, path: &Path, options: &ReadOptions) -> Result<Option<UserData>> {
        self.with_file(path, options, |s| s.read_object())
    }

    fn read_image(&self, path: &Path, options: &ReadOptions) -> Result<ImageRef> {
        self.with_file(path, options, |s| s.read_image())
    }

    fn read_node_from(&self, reader: &mut dyn Read, options: &ReadOptions) -> Result<NodeRef> {
        DataInputStream::new(reader, options.clone())?.read_node()
    }

    fn read_object_from(&self, reader: &mut dyn Read, options: &ReadOptions) -> Result<Option<UserData>> {
        DataInputStream::new(reader, options.clone())?.read_object()
    }

    fn read_image_from(&self, reader: &mut dyn Read, options: &ReadOptions) -> Result<ImageRef> {
        DataInputStream::new(reader, options.clone())?.read_image()
    }

    fn write_node(&self, node: &NodeRef, path: &Path, options: &WriteOptions) -> Result<()> {
        self.create_file(path, options, |s| s.write_node(node))
    }

    fn write_object(&self, object: &UserData, path: &Path, options: &WriteOptions) -> Result<()> {
        self.create_file(path, options, |s| s.write_object(object))
    }

    fn write_image(&self, image: &ImageRef, path: &Path, options: &WriteOptions) -> Result<()> {
        self.create_file(path, options, |s| s.write_image(image))
    }

    fn write_node_to(&self, node: &NodeRef, writer: &mut dyn Write, options: &WriteOptions) -> Result<()> {
        let mut stream = DataOutputStream::new(writer, options.clone())?;
        stream.write_node(node)?;
        stream.finish()?.flush()?;
        Ok(())
    }

    fn write_object_to(&self, object: &UserData, writer: &mut dyn Write, options: &WriteOptions) -> Result<()> {
        let mut stream = DataOutputStream::new(writer, options.clone())?;
        stream.write_object(object)?;
        stream.finish()?.flush()?;
        Ok(())
    }

    fn write_image_to(&self, image: &ImageRef, writer: &mut dyn Write, options: &WriteOptions) -> Result<()> {
        let mut stream = DataOutputStream::new(writer, options.clone())?;
        stream.write_image(image)?;
        stream.finish()?.flush()?;
        Ok(())
    }
}

/// Read a `.ive` file into a node graph.
pub fn read_node_file(path: impl AsRef<Path>, options: &ReadOptions) -> Result<NodeRef> {
    ReaderWriterIve.read_node(path.as_ref(), options)
}

/// Write a node graph to a `.ive` file.
pub fn write_node_file(node: &NodeRef, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    ReaderWriterIve.write_node(node, path.as_ref(), options)
}

/// Load a file referenced from another one.
///
/// Returns `Ok(None)` when the file cannot be found, or when nesting is too
/// deep to continue. Any other failure is an error of the referring file.
pub(crate) fn load_external_node(file_name: &str, options: &ReadOptions) -> Result<Option<NodeRef>> {
    if options.external_depth > MAX_EXTERNAL_DEPTH {
        warn!(file = %file_name, depth = options.external_depth, "external references nested too deeply");
        return Ok(None);
    }
    let Some(path) = options.file_path_list().find(file_name) else {
        return Ok(None);
    };
    debug!(file = %file_name, path = %path.display(), "loading external reference");
    match ReaderWriterIve.read_node(&path, options) {
        Ok(node) => Ok(Some(node)),
        Err(Error::FileNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;
    use std::sync::Arc;

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ive");
        let root = Arc::new(Node::group("root", vec![Arc::new(Node::group("child", vec![]))]));
        write_node_file(&root, &path, &WriteOptions::new().compressed(true)).unwrap();
        let read = read_node_file(&path, &ReadOptions::default()).unwrap();
        assert_eq!(read.name(), "root");
        assert_eq!(read.children()[0].name(), "child");
    }

    #[test]
    fn test_wrong_extension_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = Arc::new(Node::default());
        let err = write_node_file(&root, dir.path().join("scene.osg"), &WriteOptions::new()).unwrap_err();
        assert!(matches!(err, Error::FileNotHandled(_)));
        let err = read_node_file(dir.path().join("absent.ive"), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        use crate::scene::{StateSet, Uniform};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ive");
        let old_version = WriteOptions::new().with_version(20);
        write_node_file(&Arc::new(Node::group("first", vec![])), &path, &old_version).unwrap();

        let mut state = StateSet::default();
        state.add_uniform(Arc::new(Uniform::float("time", 1.0)));
        let root = Arc::new(Node::group("second", vec![]).with_state_set(Arc::new(state)));
        assert!(write_node_file(&root, &path, &old_version).is_err());

        assert_eq!(read_node_file(&path, &ReadOptions::default()).unwrap().name(), "first");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let fresh = dir.path().join("never.ive");
        assert!(write_node_file(&root, &fresh, &old_version).is_err());
        assert!(!fresh.exists());
    }

    #[test]
    fn test_stream_entry_points() {
        let rw = ReaderWriterIve;
        let root = Arc::new(Node::group("mem", vec![]));
        let mut buf = Vec::new();
        rw.write_node_to(&root, &mut buf, &WriteOptions::new()).unwrap();
        let read = rw.read_node_from(&mut buf.as_slice(), &ReadOptions::default()).unwrap();
        assert_eq!(read.name(), "mem");
    }
}
