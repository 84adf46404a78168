use crate::data::{ClassId, EntryId, RoomId};

/// Failures that abort an allocation run. None of them leave partial writes behind.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("timetable entry {entry_id} references missing class {class_id}")]
    MissingClass { entry_id: EntryId, class_id: ClassId },

    #[error("assignment targets unknown timetable entry {entry_id}")]
    UnknownEntry { entry_id: EntryId },

    #[error("timetable entry {entry_id} is a lab hour and cannot take a room")]
    LabEntry { entry_id: EntryId },

    #[error("timetable entry {entry_id} already holds room {room_id}")]
    AlreadyAllocated { entry_id: EntryId, room_id: RoomId },

    #[error("timetable entry id {entry_id} is used by more than one entry")]
    DuplicateEntry { entry_id: EntryId },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A snapshot that breaks a precondition the ingestor guarantees.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: u32 },

    #[error("duplicate class name '{0}'")]
    DuplicateClassName(String),

    #[error("timetable entry {entry_id} references missing class {class_id}")]
    MissingClass { entry_id: EntryId, class_id: ClassId },

    #[error("room {room_id} is owned by missing class {class_id}")]
    MissingOwner { room_id: RoomId, class_id: ClassId },

    #[error("timetable entry {entry_id} references missing room {room_id}")]
    MissingRoom { entry_id: EntryId, room_id: RoomId },

    #[error("timetable entry {entry_id} is flagged both lab hour and floating")]
    LabAndFloating { entry_id: EntryId },

    #[error("room {room_id} is double-booked on {day} at {slot}")]
    Clash {
        day: String,
        slot: String,
        room_id: RoomId,
    },
}

/// Rejected upload bundles.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("class '{class}' has unknown category '{category}'")]
    UnknownCategory { class: String, category: String },

    #[error("class '{0}' appears more than once in the class list")]
    DuplicateClass(String),

    #[error("timetable sheet '{0}' has no period columns")]
    NoPeriods(String),

    #[error("upload has too many rows to number ({0})")]
    TooManyRows(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
