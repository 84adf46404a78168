use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type ClassId = u32;
pub type RoomId = u32;
pub type EntryId = u32;
pub type SubjectId = u32;
pub type TeacherId = u32;

/// Whether a class owns a room of its own or has to borrow one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassCategory {
    Permanent,
    Floating,
}

/// A teaching group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub strength: u32,
    pub category: ClassCategory,
}

/// A physical room. Permanent rooms belong to exactly one class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    #[serde(default = "default_permanent")]
    pub is_permanent: bool,
    #[serde(default)]
    pub owner_class_id: Option<ClassId>,
}

fn default_permanent() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub is_lab: bool,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
}

/// One scheduled (class, day, slot) cell.
///
/// `is_lab_hour` entries mark the class as away in a lab, which frees its
/// permanent room for that cell. `is_floating` entries belong to a class
/// without a room and are the ones the allocator fills in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: EntryId,
    pub class_id: ClassId,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub day: String,
    pub slot: String,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub is_lab_hour: bool,
    #[serde(default)]
    pub is_floating: bool,
}

impl TimetableEntry {
    /// Floating theory entry that still has no room.
    pub fn needs_room(&self) -> bool {
        self.is_floating && !self.is_lab_hour && self.room_id.is_none()
    }
}

/// A full snapshot of the scheduling entities, each table in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub entries: Vec<TimetableEntry>,
}

/// A room handed to a floating entry by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct RoomAssignment {
    pub entry_id: EntryId,
    pub room_id: RoomId,
}

/// A floating entry for which no permanent room was free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedEntry {
    pub entry_id: EntryId,
    pub class_name: String,
    pub day: String,
    pub slot: String,
    pub subject: Option<String>,
    pub batch: Option<String>,
}

impl fmt::Display for UnresolvedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} at {}", self.class_name, self.day, self.slot)?;
        if let Some(subject) = &self.subject {
            write!(f, " ({subject})")?;
        }
        if let Some(batch) = &self.batch {
            write!(f, " [batch {batch}]")?;
        }
        Ok(())
    }
}

/// Outcome of one allocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub considered: usize,
    pub allocated: usize,
    pub unresolved_count: usize,
    pub assignments: Vec<RoomAssignment>,
    pub unresolved: Vec<UnresolvedEntry>,
}

/// The final output of a stateless run: the entries that changed plus the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutput {
    pub entries: Vec<TimetableEntry>,
    pub report: AllocationReport,
}
