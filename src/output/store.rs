//! Result persistence and lookup.

use crate::constants::store::{RECORD_EXTENSION, TEMP_PREFIX};
use crate::error::{Error, Result};
use crate::output::{DetectionRecord, RecordDocument};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directory of persisted detection records, one JSON document per record.
///
/// Records are identified by `<source-stem>_<unix-secs>`, with a numeric
/// suffix when that name is already taken. Documents are written to a hidden
/// temporary file first and then linked into place, so readers never see a
/// partial document and concurrent writers never overwrite each other.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a record and return its identifier.
    pub fn persist(&self, record: &DetectionRecord) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::ResultWrite {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(&record.to_document())
            .map_err(|source| Error::ResultSerialize { source })?;

        let base = format!("{}_{}", record.source_stem(), record.captured_at.timestamp());
        let temp = self.dir.join(format!(
            "{TEMP_PREFIX}{base}-{}-{}.{RECORD_EXTENSION}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&temp, json).map_err(|source| Error::ResultWrite {
            path: temp.clone(),
            source,
        })?;

        let placed = self.place(&temp, &base);
        let _ = fs::remove_file(&temp);
        let id = placed?;

        debug!("Persisted result {id}");
        Ok(id)
    }

    /// Move `temp` to the first free identifier derived from `base`.
    fn place(&self, temp: &Path, base: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            let id = if attempt == 0 {
                base.to_string()
            } else {
                format!("{base}_{attempt}")
            };
            let target = self.path_for(&id);

            match fs::hard_link(temp, &target) {
                Ok(()) => return Ok(id),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                // Filesystems without hard links fall back to a rename.
                Err(_) if !target.exists() => {
                    fs::rename(temp, &target).map_err(|source| Error::ResultWrite {
                        path: target.clone(),
                        source,
                    })?;
                    return Ok(id);
                }
                Err(_) => {}
            }
            attempt += 1;
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    /// Identifiers of every persisted record, sorted.
    pub fn ids(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if name.starts_with(TEMP_PREFIX) {
                    return None;
                }
                name.strip_suffix(RECORD_EXTENSION)?
                    .strip_suffix('.')
                    .map(str::to_string)
            })
            .collect();

        ids.sort();
        Ok(ids)
    }

    /// Every readable record. Unparseable documents are logged and skipped.
    pub fn list(&self) -> Result<Vec<RecordDocument>> {
        let mut documents = Vec::new();
        for id in self.ids()? {
            match self.load(&id) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!("Skipping result {id}: {e}"),
            }
        }
        Ok(documents)
    }

    /// The first record, in identifier order, whose identifier starts with `prefix`.
    pub fn get(&self, prefix: &str) -> Result<Option<RecordDocument>> {
        match self.ids()?.into_iter().find(|id| id.starts_with(prefix)) {
            Some(id) => self.load(&id).map(Some),
            None => Ok(None),
        }
    }

    fn load(&self, id: &str) -> Result<RecordDocument> {
        let path = self.path_for(id);
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| Error::ResultParse { path, source })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::decode::{BoundingBox, Detection};
    use crate::geo::GeoPoint;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn record(name: &str, secs: i64) -> DetectionRecord {
        DetectionRecord {
            source_path: PathBuf::from(format!("uploads/{name}")),
            processed_path: PathBuf::from(format!("processed_images/{name}")),
            geo: Some(GeoPoint {
                latitude: 12.5,
                longitude: -3.25,
            }),
            captured_at: Local.timestamp_opt(secs, 0).unwrap(),
            detections: vec![Detection {
                class_id: 12,
                label: "can".to_string(),
                confidence: 0.73,
                bbox: BoundingBox {
                    x1: 1,
                    y1: 2,
                    x2: 30,
                    y2: 40,
                },
            }],
        }
    }

    #[test]
    fn test_persist_then_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());
        let rec = record("beach.jpg", 1_700_000_000);

        let id = store.persist(&rec).unwrap();
        assert_eq!(id, "beach_1700000000");

        let doc = store.get("beach_17").unwrap().unwrap();
        assert_eq!(doc, rec.to_document());
    }

    #[test]
    fn test_same_basename_gets_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());

        let first = store.persist(&record("photo.jpg", 1_700_000_000)).unwrap();
        let second = store.persist(&record("photo.jpg", 1_700_000_000)).unwrap();
        let later = store.persist(&record("photo.png", 1_700_000_004)).unwrap();

        assert_eq!(first, "photo_1700000000");
        assert_eq!(second, "photo_1700000000_1");
        assert_eq!(later, "photo_1700000004");
        assert!(store.get(&second).unwrap().is_some());
        assert!(store.get(&later).unwrap().is_some());
        assert_eq!(store.list().unwrap().len(), 3);
    }

    #[test]
    fn test_concurrent_writers_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.persist(&record("same.jpg", 1_700_000_000)))
            })
            .collect();

        let mut ids: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(store.ids().unwrap().len(), 8);
    }

    #[test]
    fn test_list_skips_temp_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());
        store.persist(&record("ok.jpg", 1)).unwrap();

        fs::write(dir.path().join(".tmp-partial.json"), "{\"image_pa").unwrap();
        fs::write(dir.path().join("broken_2.json"), "not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.ids().unwrap(), vec!["broken_2", "ok_1"]);
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.get("broken").is_err());
    }

    #[test]
    fn test_missing_prefix_and_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path().join("never_created"));
        assert!(store.list().unwrap().is_empty());
        assert!(store.get("anything").unwrap().is_none());

        store.persist(&record("a.jpg", 5)).unwrap();
        assert!(store.get("b").unwrap().is_none());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = ResultStore::new(dir.path());
        store.persist(&record("x.jpg", 9)).unwrap();
        store.persist(&record("x.jpg", 9)).unwrap();

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .count();
        assert_eq!(leftovers, 0);
    }
}
