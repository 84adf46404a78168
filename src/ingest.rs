//! Builds a [`Timetable`] snapshot from the uploaded scheduling tables.
//!
//! The bundle carries the same six tables the admin uploads: class strengths,
//! the class → room mapping, subject types, the faculty → subject mapping,
//! one timetable sheet per class and the parallel (batch) classes. Ingesting
//! always produces a fresh snapshot; ids start at 1 in load order.

use crate::data::{
    Class, ClassCategory, ClassId, Room, RoomId, Subject, SubjectId, Teacher, TeacherId,
    Timetable, TimetableEntry,
};
use crate::error::IngestError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cells that are not academic periods.
const NON_ACADEMIC: [&str; 2] = ["activity hour", "activity"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBundle {
    #[serde(default)]
    pub class_strength: Vec<ClassStrengthRow>,
    #[serde(default)]
    pub room_mapping: Vec<RoomMappingRow>,
    #[serde(default)]
    pub class_type: Vec<SubjectTypeRow>,
    #[serde(default)]
    pub teacher_subject: Vec<TeacherSubjectRow>,
    #[serde(default)]
    pub timetables: Vec<TimetableSheet>,
    #[serde(default)]
    pub parallel_classes: Vec<ParallelClassRow>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStrengthRow {
    pub class: String,
    pub strength: u32,
    pub class_category: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMappingRow {
    pub class: String,
    pub room: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectTypeRow {
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSubjectRow {
    pub faculty: String,
    pub subject: String,
}

/// One class's weekly grid: a row per day, a cell per period column.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSheet {
    pub class: String,
    pub periods: Vec<String>,
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub day: String,
    #[serde(default)]
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelClassRow {
    pub class: String,
    pub day: String,
    pub period: String,
    pub batch: String,
    pub subject: String,
}

/// Period labels are compared after trimming, lowercasing and replacing
/// spaces with underscores, so sheet headers and batch rows line up.
pub fn normalize_slot(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

fn parse_category(class: &str, raw: &str) -> Result<ClassCategory, IngestError> {
    match raw.trim().to_lowercase().as_str() {
        "permanent" => Ok(ClassCategory::Permanent),
        "floating" => Ok(ClassCategory::Floating),
        _ => Err(IngestError::UnknownCategory {
            class: class.to_string(),
            category: raw.to_string(),
        }),
    }
}

fn next_id(len: usize) -> Result<u32, IngestError> {
    u32::try_from(len)
        .ok()
        .and_then(|n| n.checked_add(1))
        .ok_or(IngestError::TooManyRows(len))
}

pub fn ingest(bundle: &UploadBundle) -> Result<Timetable, IngestError> {
    // classes
    let mut classes: Vec<Class> = Vec::with_capacity(bundle.class_strength.len());
    let mut class_index: HashMap<String, usize> = HashMap::new();
    for row in &bundle.class_strength {
        let name = row.class.trim().to_string();
        let category = parse_category(&name, &row.class_category)?;
        if class_index.contains_key(&name) {
            return Err(IngestError::DuplicateClass(name));
        }
        class_index.insert(name.clone(), classes.len());
        classes.push(Class {
            id: next_id(classes.len())?,
            name,
            strength: row.strength,
            category,
        });
    }

    // permanent rooms, owned by the mapped class
    let mut rooms: Vec<Room> = Vec::new();
    let mut own_room: HashMap<ClassId, RoomId> = HashMap::new();
    for row in &bundle.room_mapping {
        let Some(&idx) = class_index.get(row.class.trim()) else {
            debug!("Skipping room '{}' mapped to unknown class '{}'", row.room, row.class);
            continue;
        };
        let room = Room {
            id: next_id(rooms.len())?,
            name: row.room.trim().to_string(),
            capacity: row.capacity,
            is_permanent: true,
            owner_class_id: Some(classes[idx].id),
        };
        own_room.entry(classes[idx].id).or_insert(room.id);
        rooms.push(room);
    }

    let lab_subjects: HashMap<&str, bool> = bundle
        .class_type
        .iter()
        .map(|r| (r.subject.trim(), r.kind.trim().eq_ignore_ascii_case("lab")))
        .collect();
    let is_lab = |subject: &str| lab_subjects.get(subject).copied().unwrap_or(false);

    // teachers and the subjects they teach
    let mut teachers: Vec<Teacher> = Vec::new();
    let mut teacher_ids: HashMap<String, TeacherId> = HashMap::new();
    let mut subjects: Vec<Subject> = Vec::new();
    let mut subject_by_name: HashMap<String, (SubjectId, TeacherId)> = HashMap::new();
    for row in &bundle.teacher_subject {
        let faculty = row.faculty.trim().to_string();
        let teacher_id = match teacher_ids.get(&faculty) {
            Some(&id) => id,
            None => {
                let id = next_id(teachers.len())?;
                teacher_ids.insert(faculty.clone(), id);
                teachers.push(Teacher { id, name: faculty });
                id
            }
        };

        let name = row.subject.trim().to_string();
        let subject = Subject {
            id: next_id(subjects.len())?,
            name: name.clone(),
            is_lab: is_lab(&name),
            teacher_id: Some(teacher_id),
        };
        subject_by_name.insert(name, (subject.id, teacher_id));
        subjects.push(subject);
    }

    // one sheet per class
    let mut entries: Vec<TimetableEntry> = Vec::new();
    for sheet in &bundle.timetables {
        let Some(&idx) = class_index.get(sheet.class.trim()) else {
            debug!("Skipping timetable sheet for unknown class '{}'", sheet.class);
            continue;
        };
        if sheet.periods.is_empty() && !sheet.rows.is_empty() {
            return Err(IngestError::NoPeriods(sheet.class.trim().to_string()));
        }
        let class = &classes[idx];
        let slots: Vec<String> = sheet.periods.iter().map(|p| normalize_slot(p)).collect();

        for row in &sheet.rows {
            let day = row.day.trim();
            for (slot, cell) in slots.iter().zip(&row.cells) {
                let Some(subject_name) = cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
                else {
                    continue;
                };
                if NON_ACADEMIC.contains(&subject_name.to_lowercase().as_str()) {
                    continue;
                }

                // lab: the class leaves its room
                if is_lab(subject_name) {
                    entries.push(TimetableEntry {
                        id: next_id(entries.len())?,
                        class_id: class.id,
                        subject_id: None,
                        teacher_id: None,
                        room_id: None,
                        day: day.to_string(),
                        slot: slot.clone(),
                        batch: None,
                        is_lab_hour: true,
                        is_floating: false,
                    });
                    continue;
                }

                let Some(&(subject_id, teacher_id)) = subject_by_name.get(subject_name) else {
                    debug!(
                        "Skipping '{}' for {} on {} at {}: no faculty mapping",
                        subject_name, class.name, day, slot
                    );
                    continue;
                };
                let room_id = match class.category {
                    ClassCategory::Permanent => own_room.get(&class.id).copied(),
                    ClassCategory::Floating => None,
                };
                entries.push(TimetableEntry {
                    id: next_id(entries.len())?,
                    class_id: class.id,
                    subject_id: Some(subject_id),
                    teacher_id: Some(teacher_id),
                    room_id,
                    day: day.to_string(),
                    slot: slot.clone(),
                    batch: None,
                    is_lab_hour: false,
                    is_floating: class.category == ClassCategory::Floating,
                });
            }
        }
    }

    // batches always need a room of their own
    for row in &bundle.parallel_classes {
        let Some(&idx) = class_index.get(row.class.trim()) else {
            debug!("Skipping parallel class for unknown class '{}'", row.class);
            continue;
        };
        let Some(&(subject_id, teacher_id)) = subject_by_name.get(row.subject.trim()) else {
            debug!("Skipping parallel class '{}': no faculty mapping", row.subject);
            continue;
        };
        entries.push(TimetableEntry {
            id: next_id(entries.len())?,
            class_id: classes[idx].id,
            subject_id: Some(subject_id),
            teacher_id: Some(teacher_id),
            room_id: None,
            day: row.day.trim().to_string(),
            slot: normalize_slot(&row.period),
            batch: Some(row.batch.trim().to_string()),
            is_lab_hour: false,
            is_floating: true,
        });
    }

    info!(
        "Ingested {} classes, {} rooms, {} teachers, {} subjects and {} timetable entries",
        classes.len(),
        rooms.len(),
        teachers.len(),
        subjects.len(),
        entries.len()
    );

    Ok(Timetable {
        classes,
        rooms,
        teachers,
        subjects,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn bundle() -> UploadBundle {
        UploadBundle {
            class_strength: vec![
                ClassStrengthRow {
                    class: " FY-A ".into(),
                    strength: 40,
                    class_category: "Floating".into(),
                },
                ClassStrengthRow {
                    class: "TY-B".into(),
                    strength: 45,
                    class_category: "permanent".into(),
                },
            ],
            room_mapping: vec![
                RoomMappingRow {
                    class: "TY-B".into(),
                    room: "R101".into(),
                    capacity: 45,
                },
                RoomMappingRow {
                    class: "Ghost".into(),
                    room: "R999".into(),
                    capacity: 10,
                },
            ],
            class_type: vec![
                SubjectTypeRow {
                    subject: "DBMS Lab".into(),
                    kind: "LAB".into(),
                },
                SubjectTypeRow {
                    subject: "Maths".into(),
                    kind: "theory".into(),
                },
            ],
            teacher_subject: vec![
                TeacherSubjectRow {
                    faculty: "Dr. Rao".into(),
                    subject: "Maths".into(),
                },
                TeacherSubjectRow {
                    faculty: "Dr. Rao ".into(),
                    subject: "Physics".into(),
                },
            ],
            timetables: vec![
                TimetableSheet {
                    class: "TY-B".into(),
                    periods: vec!["8.00-8.45".into(), "8.45-9.30".into()],
                    rows: vec![SheetRow {
                        day: "Monday".into(),
                        cells: vec![cell("Maths"), cell("DBMS Lab")],
                    }],
                },
                TimetableSheet {
                    class: "FY-A".into(),
                    periods: vec!["8.00-8.45".into(), "8.45-9.30".into(), "9.30-10.15".into()],
                    rows: vec![SheetRow {
                        day: " Monday".into(),
                        cells: vec![cell("Activity Hour"), cell("Maths"), None, cell("Extra")],
                    }],
                },
            ],
            parallel_classes: vec![ParallelClassRow {
                class: "TY-B".into(),
                day: "Tuesday".into(),
                period: "8.00-8.45".into(),
                batch: "B1".into(),
                subject: "Physics".into(),
            }],
        }
    }

    #[test]
    fn builds_classes_rooms_and_teachers() {
        let timetable = ingest(&bundle()).unwrap();

        assert_eq!(timetable.classes.len(), 2);
        assert_eq!(timetable.classes[0].name, "FY-A");
        assert_eq!(timetable.classes[0].category, ClassCategory::Floating);

        // the room for an unknown class is dropped
        assert_eq!(timetable.rooms.len(), 1);
        assert_eq!(timetable.rooms[0].owner_class_id, Some(2));

        assert_eq!(timetable.teachers.len(), 1);
        assert_eq!(timetable.subjects.len(), 2);
    }

    #[test]
    fn sheet_cells_become_entries() {
        let timetable = ingest(&bundle()).unwrap();
        let entries = &timetable.entries;

        // TY-B: Maths in its own room, then a lab hour
        assert_eq!(entries[0].class_id, 2);
        assert_eq!(entries[0].room_id, Some(1));
        assert!(!entries[0].is_floating);
        assert!(entries[1].is_lab_hour);
        assert_eq!(entries[1].subject_id, None);
        assert_eq!(entries[1].slot, "8.45-9.30");

        // FY-A: activity hour, blank cell and overflow cell are skipped
        let fy_a: Vec<_> = entries.iter().filter(|e| e.class_id == 1).collect();
        assert_eq!(fy_a.len(), 1);
        assert_eq!(fy_a[0].day, "Monday");
        assert!(fy_a[0].needs_room());
    }

    #[test]
    fn parallel_classes_are_floating_batches() {
        let timetable = ingest(&bundle()).unwrap();
        let batch = timetable.entries.last().unwrap();

        assert_eq!(batch.batch.as_deref(), Some("B1"));
        assert_eq!(batch.class_id, 2);
        assert!(batch.needs_room());
    }

    #[test]
    fn unmapped_theory_subject_is_skipped() {
        let mut upload = bundle();
        upload.timetables[0].rows[0].cells[0] = cell("History");

        let timetable = ingest(&upload).unwrap();
        assert!(timetable.entries.iter().all(|e| e.class_id != 2 || e.is_lab_hour || e.batch.is_some()));
    }

    #[test]
    fn rejects_unknown_category_and_duplicates() {
        let mut upload = bundle();
        upload.class_strength[0].class_category = "hybrid".into();
        assert!(matches!(ingest(&upload), Err(IngestError::UnknownCategory { .. })));

        let mut upload = bundle();
        upload.class_strength[1].class = "FY-A".into();
        assert!(matches!(ingest(&upload), Err(IngestError::DuplicateClass(name)) if name == "FY-A"));
    }

    #[test]
    fn rejects_sheet_without_periods() {
        let mut upload = bundle();
        upload.timetables[0].periods.clear();
        assert!(matches!(ingest(&upload), Err(IngestError::NoPeriods(name)) if name == "TY-B"));
    }

    #[test]
    fn ids_past_u32_range_are_rejected() {
        assert_eq!(next_id(0).unwrap(), 1);
        assert!(matches!(
            next_id(u32::MAX as usize),
            Err(IngestError::TooManyRows(_))
        ));
    }

    #[test]
    fn slot_labels_are_normalized() {
        assert_eq!(normalize_slot(" Period 1 "), "period_1");
        assert_eq!(normalize_slot("8.00-8.45"), "8.00-8.45");
    }
}
