//! JSON file persistence shared by the collector and stats tools.
//!
//! Files are read whole and overwritten whole; there is no locking and no
//! merge with what is already on disk.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::ser::PrettyFormatter;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Four-space indent used by the event and cache files.
pub const INDENT_WIDE: &[u8] = b"    ";

/// Two-space indent used by the sandwich index.
pub const INDENT_NARROW: &[u8] = b"  ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read and validate a JSON file against `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`load_json`], but a missing file yields `None`.
pub fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match load_json(path) {
        Ok(v) => Ok(Some(v)),
        Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// A file serialized in memory and not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl EncodedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the content, creating parent directories and replacing any
    /// previous file.
    pub fn write(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, &self.bytes).map_err(write_err)
    }
}

/// Pretty-print `value` for `path` without touching the disk.
pub fn encode_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    indent: &[u8],
) -> Result<EncodedFile, StoreError> {
    let mut bytes = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent);
    let mut ser = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    value.serialize(&mut ser).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(EncodedFile {
        path: path.to_path_buf(),
        bytes,
    })
}

/// Pretty-print `value` into `path`, creating parent directories and
/// replacing any previous content.
pub fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    indent: &[u8],
) -> Result<(), StoreError> {
    encode_json(path, value, indent)?.write()
}
