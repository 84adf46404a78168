//! Lends permanent rooms to floating classes while the owning class is away
//! in a lab.

pub mod allocator;
pub mod config;
pub mod data;
pub mod error;
pub mod ingest;
pub mod occupancy;
pub mod server;
pub mod store;
pub mod validate;

pub use allocator::{allocate, allocate_rooms, apply_assignments, plan_allocation};
pub use data::{AllocationOutput, AllocationReport, Timetable};
pub use error::AllocationError;
