//! Checks a snapshot against the guarantees the ingestor makes before the
//! allocator is allowed to run on it.

use crate::data::{ClassId, RoomId, Timetable};
use crate::error::ValidationError;
use itertools::Itertools;
use std::collections::HashSet;

pub fn validate_timetable(timetable: &Timetable) -> Result<(), ValidationError> {
    unique_ids("class", timetable.classes.iter().map(|c| c.id))?;
    unique_ids("room", timetable.rooms.iter().map(|r| r.id))?;
    unique_ids("teacher", timetable.teachers.iter().map(|t| t.id))?;
    unique_ids("subject", timetable.subjects.iter().map(|s| s.id))?;
    unique_ids("timetable entry", timetable.entries.iter().map(|e| e.id))?;

    if let Some(name) = timetable.classes.iter().map(|c| c.name.as_str()).duplicates().next() {
        return Err(ValidationError::DuplicateClassName(name.to_string()));
    }

    let class_ids: HashSet<ClassId> = timetable.classes.iter().map(|c| c.id).collect();
    let room_ids: HashSet<RoomId> = timetable.rooms.iter().map(|r| r.id).collect();

    for room in &timetable.rooms {
        if let Some(owner) = room.owner_class_id {
            if !class_ids.contains(&owner) {
                return Err(ValidationError::MissingOwner {
                    room_id: room.id,
                    class_id: owner,
                });
            }
        }
    }

    let mut occupied = HashSet::new();
    for entry in &timetable.entries {
        if !class_ids.contains(&entry.class_id) {
            return Err(ValidationError::MissingClass {
                entry_id: entry.id,
                class_id: entry.class_id,
            });
        }
        if entry.is_lab_hour && entry.is_floating {
            return Err(ValidationError::LabAndFloating { entry_id: entry.id });
        }
        if let Some(room_id) = entry.room_id {
            if !room_ids.contains(&room_id) {
                return Err(ValidationError::MissingRoom {
                    entry_id: entry.id,
                    room_id,
                });
            }
            if !occupied.insert((entry.day.as_str(), entry.slot.as_str(), room_id)) {
                return Err(ValidationError::Clash {
                    day: entry.day.clone(),
                    slot: entry.slot.clone(),
                    room_id,
                });
            }
        }
    }

    Ok(())
}

fn unique_ids(table: &'static str, ids: impl Iterator<Item = u32>) -> Result<(), ValidationError> {
    match ids.duplicates().next() {
        Some(id) => Err(ValidationError::DuplicateId { table, id }),
        None => Ok(()),
    }
}
