// String-keyed durable storage backends
use anyhow::Result;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DB_KV: &str = "kv";

/// Minimal key/value contract the snapshot gateway needs.
///
/// A missing key reads as `None`; each `put` replaces the whole value atomically.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    File,
    Lmdb,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            "lmdb" => Ok(BackendKind::Lmdb),
            other => Err(format!("unknown backend '{}', expected memory, file or lmdb", other)),
        }
    }
}

/// Open the backend of `kind` rooted at `data_dir`.
pub fn open_backend<P: AsRef<Path>>(kind: BackendKind, data_dir: P) -> Result<Arc<dyn KeyValueBackend>> {
    let data_dir = data_dir.as_ref();
    Ok(match kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::File => Arc::new(FileBackend::new(data_dir.join("mindmaps"))?),
        BackendKind::Lmdb => Arc::new(LmdbBackend::new(data_dir.join("lmdb"))?),
    })
}

/// Process-local backend, mostly for tests.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

/// One `<key>.json` file per key. Writes go through a temp file and rename.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        AtomicFile::new(self.path_for(key), OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(value.as_bytes()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// LMDB-backed store; every put is its own write transaction.
pub struct LmdbBackend {
    env: Arc<Env>,
    kv_db: Database<Str, Str>,
}

impl LmdbBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(1024 * 1024 * 1024) // 1GB
                .max_dbs(1)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let kv_db = env.create_database(&mut wtxn, Some(DB_KV))?;
        wtxn.commit()?;

        Ok(Self { env, kv_db })
    }
}

impl KeyValueBackend for LmdbBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.kv_db.get(&rtxn, key)?.map(str::to_string))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.kv_db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut wtxn = self.env.write_txn()?;
        let existed = self.kv_db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        Ok(existed)
    }
}
