//! File-backed storage: one file per key.

use super::Storage;
use crate::error::Result;
use std::fmt::Write as _;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Extension of value files.
const VALUE_EXT: &str = "json";

/// Extension of in-flight writes.
const TEMP_EXT: &str = "tmp";

/// Storage keeping each key in `<dir>/<key>.json`.
///
/// Key bytes outside `[A-Za-z0-9.-]` are written as `_XX` (uppercase hex),
/// `_` included, so every key gets its own file name. Writes go to a temp
/// file first and are renamed into place, so a reader never sees a
/// half-written value.
#[derive(Clone, Debug)]
pub struct FileStorage {
    /// Base directory.
    path: PathBuf,
}

impl FileStorage {
    /// Open storage at `path`, creating the directory if needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Base directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(key: &str) -> String {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
                name.push(char::from(byte));
            } else {
                let _ = write!(name, "_{:02X}", byte);
            }
        }
        name
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.path
            .join(format!("{}.{}", Self::file_name(key), VALUE_EXT))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.path
            .join(format!("{}.{}", Self::file_name(key), TEMP_EXT))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.value_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: String) -> Result<()> {
        let temp = self.temp_path(key);
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, self.value_path(key))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
