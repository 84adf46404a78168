use crate::data::{
    AllocationOutput, AllocationReport, Class, ClassId, EntryId, Room, RoomAssignment, RoomId,
    SubjectId, Timetable, TimetableEntry, UnresolvedEntry,
};
use crate::error::AllocationError;
use crate::occupancy::{LabIndex, OccupancyIndex};
use crate::validate::validate_timetable;
use log::{info, trace, warn};
use std::collections::HashMap;
use std::time::Instant;

/// Works out a room for every floating entry that still lacks one.
///
/// Entries are visited in load order and permanent rooms are tried in load
/// order; the first room that is big enough, vacated by its owner's lab, and
/// not already taken in that cell wins. Entries with no such room are
/// reported as unresolved. Nothing in `timetable` is modified.
pub fn plan_allocation(timetable: &Timetable) -> Result<AllocationReport, AllocationError> {
    let start_time = Instant::now();
    // lookups
    let class_map: HashMap<ClassId, &Class> =
        timetable.classes.iter().map(|c| (c.id, c)).collect();
    let subject_names: HashMap<SubjectId, &str> = timetable
        .subjects
        .iter()
        .map(|s| (s.id, s.name.as_str()))
        .collect();
    let candidate_rooms: Vec<&Room> = timetable.rooms.iter().filter(|r| r.is_permanent).collect();

    let labs = LabIndex::from_entries(&timetable.entries);
    let mut occupied = OccupancyIndex::from_entries(&timetable.entries);

    let work_list: Vec<&TimetableEntry> = timetable
        .entries
        .iter()
        .filter(|e| e.needs_room())
        .collect();

    info!(
        "Allocating rooms for {} floating entries from {} permanent rooms ({} occupied cells, {} lab cells)...",
        work_list.len(),
        candidate_rooms.len(),
        occupied.len(),
        labs.len()
    );

    let mut report = AllocationReport {
        considered: work_list.len(),
        ..AllocationReport::default()
    };

    for entry in work_list {
        let class = class_map
            .get(&entry.class_id)
            .ok_or(AllocationError::MissingClass {
                entry_id: entry.id,
                class_id: entry.class_id,
            })?;

        let room = candidate_rooms
            .iter()
            .copied()
            .find(|room| is_room_usable(room, class, entry, &labs, &occupied));

        match room {
            Some(room) => {
                occupied.occupy(&entry.day, &entry.slot, room.id);
                trace!(
                    "Entry {} ({} on {} at {}) -> room {}",
                    entry.id, class.name, entry.day, entry.slot, room.name
                );
                report.assignments.push(RoomAssignment {
                    entry_id: entry.id,
                    room_id: room.id,
                });
            }
            None => {
                let unresolved = UnresolvedEntry {
                    entry_id: entry.id,
                    class_name: class.name.clone(),
                    day: entry.day.clone(),
                    slot: entry.slot.clone(),
                    subject: entry
                        .subject_id
                        .and_then(|id| subject_names.get(&id))
                        .map(|name| name.to_string()),
                    batch: entry.batch.clone(),
                };
                warn!("No free room for {unresolved}");
                report.unresolved.push(unresolved);
            }
        }
    }

    report.allocated = report.assignments.len();
    report.unresolved_count = report.unresolved.len();

    info!(
        "Allocation planned in {:.2?}: {} considered, {} allocated, {} unresolved",
        start_time.elapsed(),
        report.considered,
        report.allocated,
        report.unresolved_count
    );
    Ok(report)
}

// capacity, availability (owner away in a lab) and clash checks
fn is_room_usable(
    room: &Room,
    class: &Class,
    entry: &TimetableEntry,
    labs: &LabIndex<'_>,
    occupied: &OccupancyIndex<'_>,
) -> bool {
    if room.capacity < class.strength {
        return false;
    }

    // a room with no owner is never vacated
    let Some(owner) = room.owner_class_id else {
        return false;
    };
    if !labs.in_lab(owner, &entry.day, &entry.slot) {
        return false;
    }

    !occupied.is_occupied(&entry.day, &entry.slot, room.id)
}

/// Writes planned rooms into `entries`.
///
/// Every target is checked before the first write, so either all
/// assignments land or none do. Entry ids must be unique, otherwise a room
/// could land in a cell it was never planned for.
pub fn apply_assignments(
    entries: &mut [TimetableEntry],
    assignments: &[RoomAssignment],
) -> Result<(), AllocationError> {
    let mut positions: HashMap<EntryId, usize> = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        if positions.insert(entry.id, i).is_some() {
            return Err(AllocationError::DuplicateEntry { entry_id: entry.id });
        }
    }

    let mut pending: HashMap<EntryId, RoomId> = HashMap::with_capacity(assignments.len());
    let mut targets = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let idx = *positions
            .get(&assignment.entry_id)
            .ok_or(AllocationError::UnknownEntry {
                entry_id: assignment.entry_id,
            })?;
        let entry = &entries[idx];

        if entry.is_lab_hour {
            return Err(AllocationError::LabEntry { entry_id: entry.id });
        }
        if let Some(room_id) = entry.room_id.or_else(|| pending.get(&entry.id).copied()) {
            return Err(AllocationError::AlreadyAllocated {
                entry_id: entry.id,
                room_id,
            });
        }

        pending.insert(entry.id, assignment.room_id);
        targets.push((idx, assignment.room_id));
    }

    for (idx, room_id) in targets {
        entries[idx].room_id = Some(room_id);
    }
    Ok(())
}

/// Plans and applies in one go. On error the timetable is unchanged.
pub fn allocate_rooms(timetable: &mut Timetable) -> Result<AllocationReport, AllocationError> {
    let report = plan_allocation(timetable)?;
    apply_assignments(&mut timetable.entries, &report.assignments)?;
    Ok(report)
}

/// Runs the allocator over an owned snapshot and returns only the entries it changed.
///
/// The snapshot is validated first, since it has not been through the store.
pub fn allocate(mut timetable: Timetable) -> Result<AllocationOutput, AllocationError> {
    validate_timetable(&timetable)?;
    let report = allocate_rooms(&mut timetable)?;

    let changed: HashMap<EntryId, RoomId> = report
        .assignments
        .iter()
        .map(|a| (a.entry_id, a.room_id))
        .collect();
    let entries = timetable
        .entries
        .into_iter()
        .filter(|e| changed.contains_key(&e.id))
        .collect();

    Ok(AllocationOutput { entries, report })
}
