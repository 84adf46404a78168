//! In-memory lookups built once per allocation run.
//!
//! Both indexes borrow the day/slot labels from the snapshot they were built
//! from, so they live no longer than the run that owns them.

use crate::data::{ClassId, RoomId, TimetableEntry};
use std::collections::HashSet;

/// The set of `(day, slot, room)` cells that already hold a class.
#[derive(Debug, Default, Clone)]
pub struct OccupancyIndex<'a> {
    cells: HashSet<(&'a str, &'a str, RoomId)>,
}

impl<'a> OccupancyIndex<'a> {
    /// Every entry with a room counts, whatever its category or lab flag.
    pub fn from_entries(entries: &'a [TimetableEntry]) -> Self {
        let cells = entries
            .iter()
            .filter_map(|e| e.room_id.map(|room| (e.day.as_str(), e.slot.as_str(), room)))
            .collect();
        Self { cells }
    }

    pub fn is_occupied(&self, day: &str, slot: &str, room: RoomId) -> bool {
        self.cells.contains(&(day, slot, room))
    }

    /// Marks a cell as taken. Returns `false` if it already was.
    pub fn occupy(&mut self, day: &'a str, slot: &'a str, room: RoomId) -> bool {
        self.cells.insert((day, slot, room))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// `(class, day, slot)` cells in which the class is away in a lab.
#[derive(Debug, Default, Clone)]
pub struct LabIndex<'a> {
    cells: HashSet<(ClassId, &'a str, &'a str)>,
}

impl<'a> LabIndex<'a> {
    pub fn from_entries(entries: &'a [TimetableEntry]) -> Self {
        let cells = entries
            .iter()
            .filter(|e| e.is_lab_hour)
            .map(|e| (e.class_id, e.day.as_str(), e.slot.as_str()))
            .collect();
        Self { cells }
    }

    pub fn in_lab(&self, class: ClassId, day: &str, slot: &str) -> bool {
        self.cells.contains(&(class, day, slot))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, class_id: ClassId, room_id: Option<RoomId>, lab: bool) -> TimetableEntry {
        TimetableEntry {
            id,
            class_id,
            subject_id: None,
            teacher_id: None,
            room_id,
            day: "Monday".into(),
            slot: "Slot1".into(),
            batch: None,
            is_lab_hour: lab,
            is_floating: false,
        }
    }

    #[test]
    fn occupancy_counts_every_entry_with_a_room() {
        let entries = vec![
            entry(1, 1, Some(10), false),
            entry(2, 2, None, false),
            entry(3, 3, Some(11), true),
        ];
        let index = OccupancyIndex::from_entries(&entries);

        assert_eq!(index.len(), 2);
        assert!(index.is_occupied("Monday", "Slot1", 10));
        assert!(index.is_occupied("Monday", "Slot1", 11));
        assert!(!index.is_occupied("Monday", "Slot2", 10));
        assert!(!index.is_occupied("Tuesday", "Slot1", 10));
    }

    #[test]
    fn occupy_rejects_a_taken_cell() {
        let mut index = OccupancyIndex::default();
        assert!(index.is_empty());
        assert!(index.occupy("Monday", "Slot1", 7));
        assert!(!index.occupy("Monday", "Slot1", 7));
        assert!(index.occupy("Monday", "Slot2", 7));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn lab_index_only_keeps_lab_hours() {
        let entries = vec![entry(1, 5, None, true), entry(2, 6, None, false)];
        let labs = LabIndex::from_entries(&entries);

        assert_eq!(labs.len(), 1);
        assert!(labs.in_lab(5, "Monday", "Slot1"));
        assert!(!labs.in_lab(6, "Monday", "Slot1"));
        assert!(!labs.in_lab(5, "Monday", "Slot2"));
    }
}
