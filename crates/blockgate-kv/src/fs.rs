//! Filesystem-backed key-value namespaces.
//!
//! # Layout
//!
//! ```text
//! root/
//! └── {hex(namespace)}/
//!     └── {hex(key)}        ← one record per key
//! ```
//!
//! Names are hex-encoded so any UTF-8 namespace or key is a valid file name.
//!
//! # Record format
//!
//! ```text
//! [4 bytes: CRC32 of tag + payload (little-endian u32)]
//! [1 byte:  value tag (0 = bytes, 1 = string)]
//! [N bytes: payload]
//! ```
//!
//! Records are written to a temporary file in the namespace directory and
//! renamed into place, so a reader sees either the old or the new record.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{KvError, KvResult};
use crate::traits::{validate_namespace, KvBackend, KvStore, KvValue};

/// Header size: 4 bytes CRC + 1 byte tag.
const HEADER_SIZE: usize = 5;

const TAG_BYTES: u8 = 0;
const TAG_STRING: u8 = 1;

/// Longest key (in bytes) whose hex form still fits a 255-byte file name.
pub const MAX_KEY_LEN: usize = 127;

/// Flush strategy for record writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` every record before it is renamed into place.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering.
    OsDefault,
}

/// Filesystem backend rooted at one directory.
#[derive(Clone, Debug)]
pub struct FsBackend {
    root: PathBuf,
    sync_mode: SyncMode,
}

impl FsBackend {
    /// Create a backend rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> KvResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            sync_mode: SyncMode::default(),
        })
    }

    /// Use `mode` for subsequent writes through stores opened by this backend.
    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KvBackend for FsBackend {
    fn open(&self, name: &str) -> KvResult<Arc<dyn KvStore>> {
        validate_namespace(name)?;
        let dir = self.root.join(hex::encode(name));
        fs::create_dir_all(&dir)?;
        debug!(namespace = name, dir = %dir.display(), "opened filesystem namespace");
        let store: Arc<dyn KvStore> = Arc::new(FsStore {
            namespace: name.to_string(),
            dir,
            sync_mode: self.sync_mode,
        });
        Ok(store)
    }

    fn namespaces(&self) -> KvResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = decode_name(&entry.file_name().to_string_lossy()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// One filesystem namespace.
///
/// Several `FsStore` handles may address the same directory; each write is a
/// single atomic rename, so handles never observe torn records.
#[derive(Debug)]
pub struct FsStore {
    namespace: String,
    dir: PathBuf,
    sync_mode: SyncMode,
}

impl FsStore {
    /// Directory holding this namespace's records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> KvResult<PathBuf> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(KvError::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LEN,
            });
        }
        Ok(self.dir.join(hex::encode(key)))
    }

    fn corrupt(&self, key: &str, reason: impl Into<String>) -> KvError {
        KvError::Corrupt {
            namespace: self.namespace.clone(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn decode_record(&self, key: &str, raw: Vec<u8>) -> KvResult<KvValue> {
        if raw.len() < HEADER_SIZE {
            return Err(self.corrupt(key, format!("record too short ({} bytes)", raw.len())));
        }
        let expected = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let actual = crc32fast::hash(&raw[4..]);
        if expected != actual {
            return Err(self.corrupt(
                key,
                format!("checksum mismatch: expected {expected:#010x}, got {actual:#010x}"),
            ));
        }
        let tag = raw[4];
        let payload = raw[HEADER_SIZE..].to_vec();
        match tag {
            TAG_BYTES => Ok(KvValue::Bytes(payload)),
            TAG_STRING => String::from_utf8(payload)
                .map(KvValue::String)
                .map_err(|_| self.corrupt(key, "string record is not valid UTF-8")),
            other => Err(self.corrupt(key, format!("unknown value tag {other}"))),
        }
    }
}

fn encode_record(value: &KvValue) -> Vec<u8> {
    let (tag, payload) = match value {
        KvValue::Bytes(b) => (TAG_BYTES, b.as_slice()),
        KvValue::String(s) => (TAG_STRING, s.as_bytes()),
    };
    let mut body = Vec::with_capacity(1 + payload.len());
    body.push(tag);
    body.extend_from_slice(payload);

    let mut record = Vec::with_capacity(4 + body.len());
    record.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    record.extend_from_slice(&body);
    record
}

fn decode_name(file_name: &str) -> Option<String> {
    let bytes = hex::decode(file_name).ok()?;
    String::from_utf8(bytes).ok()
}

impl KvStore for FsStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> KvResult<Option<KvValue>> {
        let path = self.record_path(key)?;
        match fs::read(&path) {
            Ok(raw) => self.decode_record(key, raw).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: KvValue) -> KvResult<()> {
        let path = self.record_path(key)?;
        // The directory may have been removed underneath us.
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&encode_record(&value))?;
        if self.sync_mode == SyncMode::EveryWrite {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&path).map_err(|e| KvError::Io(e.error))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> KvResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            // Temporary files from in-flight writes are not hex and are skipped.
            if let Some(key) = decode_name(&entry.file_name().to_string_lossy()) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn clear_all(&self) -> KvResult<()> {
        for key in self.keys()? {
            self.delete(&key)?;
        }
        Ok(())
    }

    fn flush(&self) -> KvResult<()> {
        // Renames are only durable once the directory entry is synced.
        if cfg!(unix) && self.dir.exists() {
            fs::File::open(&self.dir)?.sync_all()?;
        }
        Ok(())
    }
}
