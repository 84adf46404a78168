//! JSON-file persistence for the timetable snapshot.
//!
//! The whole snapshot is written as one versioned document. Writes go to a
//! sibling temp file that is renamed over the target, so a reader never sees
//! half of a commit.

use crate::allocator::{apply_assignments, plan_allocation};
use crate::data::{AllocationReport, Timetable};
use crate::error::StoreError;
use crate::validate::validate_timetable;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Version number for the store format (increment when format changes)
const STORE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoredTimetable {
    version: u32,
    timetable: Timetable,
}

#[derive(Debug)]
pub struct TimetableStore {
    path: Option<PathBuf>,
    timetable: Timetable,
}

impl TimetableStore {
    /// Opens the store at `path`. A missing file is an empty timetable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let timetable = match fs::File::open(&path) {
            Ok(file) => {
                let stored: StoredTimetable = serde_json::from_reader(BufReader::new(file))?;
                if stored.version != STORE_VERSION {
                    return Err(StoreError::VersionMismatch {
                        expected: STORE_VERSION,
                        found: stored.version,
                    });
                }
                validate_timetable(&stored.timetable)?;
                stored.timetable
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", path.display());
                Timetable::default()
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Opened timetable store at {} ({} entries)",
            path.display(),
            timetable.entries.len()
        );
        Ok(Self {
            path: Some(path),
            timetable,
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            timetable: Timetable::default(),
        }
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    /// Drops everything and loads `timetable` in its place.
    pub fn replace(&mut self, timetable: Timetable) -> Result<(), StoreError> {
        validate_timetable(&timetable)?;
        self.persist(&timetable)?;
        info!(
            "Replaced timetable: {} classes, {} rooms, {} entries",
            timetable.classes.len(),
            timetable.rooms.len(),
            timetable.entries.len()
        );
        self.timetable = timetable;
        Ok(())
    }

    /// Allocates rooms over the stored snapshot and commits the result.
    ///
    /// The new snapshot is only swapped in after it has been written, so a
    /// failed run leaves both the file and the in-memory copy as they were.
    pub fn run_allocation(&mut self) -> Result<AllocationReport, StoreError> {
        let report = plan_allocation(&self.timetable)?;
        if report.assignments.is_empty() {
            return Ok(report);
        }

        let mut next = self.timetable.clone();
        apply_assignments(&mut next.entries, &report.assignments)?;
        self.persist(&next)?;
        self.timetable = next;
        Ok(report)
    }

    fn persist(&self, timetable: &Timetable) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomically(path, timetable)
    }
}

fn write_atomically(path: &Path, timetable: &Timetable) -> Result<(), StoreError> {
    let stored = StoredTimetable {
        version: STORE_VERSION,
        timetable: timetable.clone(),
    };
    let tmp = path.with_extension("json.tmp");

    let result = (|| -> Result<(), StoreError> {
        let mut file = fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, &stored)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
