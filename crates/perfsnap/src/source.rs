//! Snapshot sources.
//!
//! The decoder and library never touch the OS. Everything they read comes
//! through [`SnapshotSource::fetch`], keyed the way the performance-data
//! registry value is queried: `"Global"` for every category, or the
//! decimal object id of one category.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::snapshot::RawSnapshot;
use crate::{Error, Result};

/// Key of the snapshot holding every category.
pub const GLOBAL_KEY: &str = "Global";

const RAW_EXTENSION: &str = "bin";
const ZSTD_EXTENSION: &str = "bin.zst";

/// Supplies snapshot bytes by key.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self, key: &str) -> Result<RawSnapshot>;
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    fn fetch(&self, key: &str) -> Result<RawSnapshot> {
        (**self).fetch(key)
    }
}

/// In-memory snapshots, for tests and replay.
#[derive(Default)]
pub struct MemorySource {
    snapshots: RwLock<FxHashMap<String, RawSnapshot>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, key: impl Into<String>, snapshot: impl Into<RawSnapshot>) -> Self {
        self.insert(key, snapshot);
        self
    }

    /// Replace the snapshot served for `key`.
    pub fn insert(&self, key: impl Into<String>, snapshot: impl Into<RawSnapshot>) {
        self.snapshots.write().insert(key.into(), snapshot.into());
    }

    pub fn remove(&self, key: &str) -> Option<RawSnapshot> {
        self.snapshots.write().remove(key)
    }
}

impl SnapshotSource for MemorySource {
    fn fetch(&self, key: &str) -> Result<RawSnapshot> {
        trace!(key, "memory fetch");
        self.snapshots
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::Fetch {
                key: key.to_string(),
                reason: "no snapshot for key".to_string(),
            })
    }
}

/// A directory of captured snapshots, one file per key.
///
/// `<key>.bin` holds the raw bytes, `<key>.bin.zst` a zstd-compressed copy.
/// The raw file wins when both exist.
#[derive(Clone, Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{key}.{extension}"))
    }

    /// Write `snapshot` under `key`, optionally compressed.
    pub fn save(&self, key: &str, snapshot: &RawSnapshot, compress: bool) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let extension = if compress { ZSTD_EXTENSION } else { RAW_EXTENSION };
        let path = self.path(key, extension);

        let mut writer = BufWriter::new(File::create(&path)?);
        if compress {
            let mut encoder = zstd::stream::Encoder::new(&mut writer, 3)?;
            encoder.write_all(snapshot.as_bytes())?;
            encoder.finish()?;
        } else {
            writer.write_all(snapshot.as_bytes())?;
        }
        writer.flush()?;

        debug!(key, path = %path.display(), size = snapshot.len(), "snapshot saved");
        Ok(path)
    }
}

impl SnapshotSource for DirSource {
    fn fetch(&self, key: &str) -> Result<RawSnapshot> {
        for extension in [RAW_EXTENSION, ZSTD_EXTENSION] {
            let path = self.path(key, extension);
            match read_snapshot_file(&path) {
                Ok(snapshot) => return Ok(snapshot),
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Err(Error::Fetch {
            key: key.to_string(),
            reason: format!("no snapshot file in {}", self.root.display()),
        })
    }
}

/// Load one snapshot file, decompressing `.zst` files.
pub fn read_snapshot_file(path: impl AsRef<Path>) -> Result<RawSnapshot> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut data = Vec::new();

    if path.extension().is_some_and(|ext| ext == "zst") {
        let mut decoder = zstd::stream::Decoder::new(BufReader::new(file))?;
        decoder.read_to_end(&mut data)?;
    } else {
        BufReader::new(file).read_to_end(&mut data)?;
    }

    trace!(path = %path.display(), size = data.len(), "snapshot loaded");
    Ok(RawSnapshot::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with("230", vec![1u8, 2, 3]);
        assert_eq!(source.fetch("230").unwrap().as_bytes(), &[1, 2, 3]);
        assert!(matches!(source.fetch("238"), Err(Error::Fetch { key, .. }) if key == "238"));

        source.insert("230", vec![4u8]);
        assert_eq!(source.fetch("230").unwrap().len(), 1);
        assert!(source.remove("230").is_some());
        assert!(source.fetch("230").is_err());
    }

    #[test]
    fn test_dir_source_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirSource::new(dir.path());
        let snapshot = RawSnapshot::from(vec![7u8; 300]);

        let raw_path = source.save("Global", &snapshot, false).unwrap();
        assert!(raw_path.ends_with("Global.bin"));
        let zst_path = source.save("238", &snapshot, true).unwrap();
        assert!(zst_path.ends_with("238.bin.zst"));

        assert_eq!(source.fetch("Global").unwrap(), snapshot);
        assert_eq!(source.fetch("238").unwrap(), snapshot);
        assert!(matches!(source.fetch("2"), Err(Error::Fetch { .. })));
    }
}
