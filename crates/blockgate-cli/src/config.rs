use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use blockgate_kv::{FsBackend, KvBackend, MemoryBackend};
use blockgate_uri::Locator;
use serde::{Deserialize, Serialize};

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "blockgate.toml";

/// Physical store behind the `kv` protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One file per key under `data_dir`.
    #[default]
    Fs,
    /// Process-local; contents vanish when the command exits.
    Memory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockgateConfig {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub base_locator: String,
}

impl Default for BlockgateConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".blockgate"),
            backend: BackendKind::Fs,
            base_locator: "kv://blockgate?name=default&store=data".into(),
        }
    }
}

impl BlockgateConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load `explicit` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else defaults. An explicit path that does not exist is an error.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, backend: Option<BackendKind>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(kind) = backend {
            self.backend = kind;
        }
        self
    }

    pub fn base_locator(&self) -> anyhow::Result<Locator> {
        self.base_locator
            .parse()
            .with_context(|| format!("invalid base_locator {:?}", self.base_locator))
    }

    pub fn open_backend(&self) -> anyhow::Result<Arc<dyn KvBackend>> {
        let backend: Arc<dyn KvBackend> = match self.backend {
            BackendKind::Fs => Arc::new(
                FsBackend::new(&self.data_dir)
                    .with_context(|| format!("opening data dir {}", self.data_dir.display()))?,
            ),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(backend)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }
}
