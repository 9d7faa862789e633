//! Disk persistence for the file-backed stores.
//!
//! Writes go through a named temp file in the target directory followed by a
//! rename, so a crash mid-write never leaves a truncated store behind.

use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

/// Load a JSON store from disk. A missing file is a fresh store; a corrupt
/// file is treated the same way (logged, not fatal) and gets rewritten on the
/// next mutation.
pub fn load_json_or_default<T>(path: &Path) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store file is corrupt; starting empty");
            Ok(T::default())
        }
    }
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let tmp = NamedTempFile::new_in(parent).context("create temp store file")?;
    {
        let mut writer = BufWriter::new(&tmp);
        serde_json::to_writer(&mut writer, value).context("serialize store")?;
        writer.flush().context("flush store")?;
    }
    tmp.persist(path)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Async wrapper: file IO happens off the runtime's core threads.
pub async fn persist_json<T>(path: PathBuf, value: T) -> anyhow::Result<()>
where
    T: Serialize + Send + 'static,
{
    tokio::task::spawn_blocking(move || write_json_atomic(&path, &value))
        .await
        .context("join persist task")?
}
