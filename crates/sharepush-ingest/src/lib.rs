use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use sharepush_core::error::{Result, SharePushError};
use sharepush_core::records::{Collection, Record, RecordStore};
use sharepush_core::source::RecordSource;

pub mod csv;

/// Loads every CSV file in a directory as a collection named after the file
/// stem (`works.csv` becomes `works`). The first column is the natural key.
pub struct DataDirSource {
    dir: PathBuf,
}

impl DataDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn collection_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden || !entry.file_type()?.is_file() {
                continue;
            }
            files.push(entry.path());
        }
        files.sort();
        Ok(files)
    }
}

impl RecordSource for DataDirSource {
    fn name(&self) -> &str {
        "data_dir"
    }

    fn load(&self) -> Result<RecordStore> {
        info!(dir = %self.dir.display(), "Loading records");

        let files = self.collection_files()?;
        if files.is_empty() {
            return Err(SharePushError::EmptySource(format!(
                "no data files in {}",
                self.dir.display()
            )));
        }

        let mut store = RecordStore::new();
        for path in files {
            let collection = load_collection(&path)?;
            debug!(collection = %collection.name, rows = collection.len(), "Loaded collection");
            store.insert_collection(collection);
        }

        if store.is_empty() {
            return Err(SharePushError::EmptySource(format!(
                "data files in {} contain no rows",
                self.dir.display()
            )));
        }

        info!(
            collections = ?store.collection_names(),
            records = store.record_count(),
            "Records loaded"
        );
        Ok(store)
    }
}

/// Parse one CSV file into a collection.
pub fn load_collection(path: &Path) -> Result<Collection> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| SharePushError::Config(format!("bad data file name: {}", path.display())))?;
    let text = fs::read_to_string(path)?;
    parse_collection(&name, &text)
}

/// Map each row onto the header. Short rows leave trailing columns absent;
/// extra cells beyond the header are dropped.
pub fn parse_collection(name: &str, text: &str) -> Result<Collection> {
    let mut rows = csv::parse_rows(name, text)?.into_iter();
    let mut collection = Collection::new(name);

    let Some(headers) = rows.next() else {
        warn!(collection = %name, "Data file is empty");
        return Ok(collection);
    };
    let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

    for cells in rows {
        let Some(key) = cells.first().map(|k| k.trim().to_string()) else {
            continue;
        };
        if key.is_empty() {
            warn!(collection = %name, "Skipping row without a key");
            continue;
        }
        if collection.get(&key).is_some() {
            warn!(collection = %name, key = %key, "Duplicate key, later row wins");
        }

        let mut record = Record::new(name, key);
        for (header, value) in headers.iter().zip(cells) {
            record.fields.insert(header.clone(), value);
        }
        collection.insert(record);
    }

    Ok(collection)
}
