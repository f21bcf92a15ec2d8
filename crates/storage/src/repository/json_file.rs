use std::fs;
use std::path::Path;

use atomic_write_file::AtomicWriteFile;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StorageError};

/// Reads a JSON document. A missing or blank file yields `T::default()`; a file that exists but
/// cannot be read or parsed is reported as `StoreUnavailable`.
pub(crate) fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let text = fs::read_to_string(path).map_err(|e| {
        StorageError::StoreUnavailable(format!("cannot read {}: {}", path.display(), e))
    })?;

    if text.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&text).map_err(|e| {
        StorageError::StoreUnavailable(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Replaces the file contents atomically; readers see either the old or the new document.
pub(crate) fn save<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = AtomicWriteFile::open(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.commit()?;

    Ok(())
}
