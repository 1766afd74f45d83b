use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use tracing::{info, warn};

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// The given value becomes the whole file.
    WriteWhole,
    /// The file is a JSON array; each write appends one element.
    AppendOne,
}

/// Sole owner of a JSON record file. Every write is a full read-modify-write
/// under an exclusive lock on the file.
pub struct RecordStore {
    path: PathBuf,
    mode: StoreMode,
    pretty: bool,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, mode: StoreMode) -> Self {
        Self {
            path: path.into(),
            mode,
            pretty: mode == StoreMode::AppendOne,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("Failed to lock {}", self.path.display()))?;

        let result = match self.mode {
            StoreMode::WriteWhole => self.rewrite(&mut file, value),
            StoreMode::AppendOne => self.append_locked(&mut file, value),
        };
        FileExt::unlock(&file).ok();
        result
    }

    fn append_locked<T: Serialize>(&self, file: &mut File, value: &T) -> Result<()> {
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let mut records = load_array(&raw, &self.path);
        records.push(serde_json::to_value(value)?);
        self.rewrite(file, &records)?;
        info!("Appended record #{} to {}", records.len(), self.path.display());
        Ok(())
    }

    fn rewrite<T: Serialize>(&self, file: &mut File, value: &T) -> Result<()> {
        let mut buf = Vec::new();
        if self.pretty {
            let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
            value.serialize(&mut ser)?;
        } else {
            serde_json::to_writer(&mut buf, value)?;
        }

        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(&buf)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        file.flush()?;
        Ok(())
    }
}

/// Existing store content as an array. Blank is empty, a lone value is
/// wrapped, and anything unparsable is dropped.
fn load_array(raw: &[u8], path: &Path) -> Vec<Value> {
    if raw.trim_ascii().is_empty() {
        return Vec::new();
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(other) => vec![other],
        Err(e) => {
            warn!(
                "Store {} is not valid JSON ({}), starting a new array",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}
