//! Vectorizer snapshots
//!
//! A snapshot is the gzip-compressed JSON form of a [`VectorizerSnapshot`],
//! written atomically next to a `.sha256` sidecar holding the hex digest of
//! the compressed bytes. Loading verifies the digest when the sidecar exists.

use crate::error::{Result, StorageError};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use jsonvec_schema::{JsonVectorizer, VectorizerSnapshot};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SNAPSHOT_EXTENSION: &str = "snapshot";
pub const CHECKSUM_EXTENSION: &str = "sha256";

/// Snapshot file metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self { snapshot_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// `<prefix>-<utc timestamp>.snapshot`
    pub fn generate_snapshot_name(prefix: &str) -> String {
        let now: DateTime<Utc> = Utc::now();
        format!("{}-{}.{}", prefix, now.format("%Y-%m-%d-%H-%M-%S"), SNAPSHOT_EXTENSION)
    }

    /// Path of a snapshot, the extension being optional in `name`
    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        if Path::new(name).extension().and_then(|ext| ext.to_str()) == Some(SNAPSHOT_EXTENSION) {
            self.snapshot_dir.join(name)
        } else {
            self.snapshot_dir.join(format!("{}.{}", name, SNAPSHOT_EXTENSION))
        }
    }

    /// Save under a timestamped name
    pub fn create(&self, prefix: &str, snapshot: &VectorizerSnapshot) -> Result<SnapshotDescription> {
        self.save(&Self::generate_snapshot_name(prefix), snapshot)
    }

    /// Save under `name`, replacing any snapshot of the same name
    pub fn save(&self, name: &str, snapshot: &VectorizerSnapshot) -> Result<SnapshotDescription> {
        let path = self.snapshot_path(name);

        let json_data = serde_json::to_vec(snapshot)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json_data)?;
        let bytes = encoder.finish()?;
        let checksum = sha256_hex(&bytes);

        write_atomic(&path, &bytes)?;
        write_atomic(&checksum_path(&path), checksum.as_bytes())?;
        debug!(path = %path.display(), size = bytes.len(), "saved snapshot");

        describe(&path, Some(checksum))
    }

    pub fn load(&self, name: &str) -> Result<VectorizerSnapshot> {
        load_from_path(&self.snapshot_path(name))
    }

    /// Load and rebuild the vectorizer
    pub fn load_vectorizer(&self, name: &str) -> Result<JsonVectorizer> {
        let snapshot = self.load(name)?;
        Ok(JsonVectorizer::from_snapshot(&snapshot)?)
    }

    /// Snapshots in the directory, newest name first
    pub fn list(&self) -> Result<Vec<SnapshotDescription>> {
        let mut snapshots = Vec::new();
        if !self.snapshot_dir.exists() {
            return Ok(snapshots);
        }

        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some(SNAPSHOT_EXTENSION) {
                let checksum = fs::read_to_string(checksum_path(&path))
                    .ok()
                    .map(|s| s.trim().to_string());
                snapshots.push(describe(&path, checksum)?);
            }
        }

        snapshots.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(snapshots)
    }

    /// Delete a snapshot and its sidecar, returning whether it existed
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.snapshot_path(name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        let sidecar = checksum_path(&path);
        if sidecar.exists() {
            fs::remove_file(sidecar)?;
        }
        Ok(true)
    }
}

/// Load a snapshot file, verifying its sidecar digest when present
pub fn load_from_path(path: &Path) -> Result<VectorizerSnapshot> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;

    match fs::read_to_string(checksum_path(path)) {
        Ok(expected) => {
            let expected = expected.trim().to_string();
            let actual = sha256_hex(&bytes);
            if actual != expected {
                return Err(StorageError::ChecksumMismatch {
                    name: path.display().to_string(),
                    expected,
                    actual,
                });
            }
        }
        Err(_) => warn!(path = %path.display(), "snapshot has no checksum, loading unverified"),
    }

    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut json_data = Vec::new();
    decoder.read_to_end(&mut json_data)?;
    Ok(serde_json::from_slice(&json_data)?)
}

fn checksum_path(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    file_name.push(".");
    file_name.push(CHECKSUM_EXTENSION);
    path.with_file_name(file_name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
        })?;
    Ok(())
}

fn describe(path: &Path, checksum: Option<String>) -> Result<SnapshotDescription> {
    let metadata = fs::metadata(path)?;
    let creation_time = metadata
        .created()
        .or_else(|_| metadata.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .and_then(|d| DateTime::from_timestamp(d.as_secs() as i64, 0))
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SnapshotDescription {
        name,
        creation_time,
        size: metadata.len(),
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn fitted() -> JsonVectorizer {
        let docs: Vec<Value> = (0..10)
            .map(|i| json!({"flag": i % 2 == 0, "n": i, "tag": if i < 5 { "low" } else { "high" }}))
            .collect();
        let mut vectorizer = JsonVectorizer::new(false);
        vectorizer.fit(Some(&docs)).unwrap();
        vectorizer
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        let vectorizer = fitted();

        let description = manager.save("model", &vectorizer.snapshot()).unwrap();
        assert_eq!(description.name, "model.snapshot");
        assert!(description.size > 0);
        assert_eq!(description.checksum.as_ref().map(String::len), Some(64));
        assert!(dir.path().join("model.snapshot.sha256").exists());

        let loaded = manager.load("model").unwrap();
        assert_eq!(loaded, vectorizer.snapshot());
        let restored = manager.load_vectorizer("model.snapshot").unwrap();
        assert_eq!(restored.feature_names(), vectorizer.feature_names());
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let dir = tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        manager.save("model", &fitted().snapshot()).unwrap();

        fs::write(dir.path().join("model.snapshot.sha256"), "0".repeat(64)).unwrap();
        assert!(matches!(
            manager.load("model"),
            Err(StorageError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        assert!(matches!(manager.load("nope"), Err(StorageError::NotFound(_))));
        assert!(!manager.delete("nope").unwrap());
    }

    #[test]
    fn test_list_and_delete() {
        let dir = tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        let snapshot = fitted().snapshot();
        manager.save("a", &snapshot).unwrap();
        manager.save("b", &snapshot).unwrap();
        let created = manager.create("model", &snapshot).unwrap();
        assert!(created.name.starts_with("model-"));

        let names: Vec<String> = manager.list().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![created.name.clone(), "b.snapshot".to_string(), "a.snapshot".to_string()]);

        assert!(manager.delete("a").unwrap());
        assert!(!dir.path().join("a.snapshot.sha256").exists());
        assert_eq!(manager.list().unwrap().len(), 2);
    }
}
