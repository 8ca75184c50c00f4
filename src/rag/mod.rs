//! Resource allocation graph model and wait-for deadlock detection.
//!
//! [`EntityStore`] owns the processes, resources, allocations and requests.
//! Detection is never automatic: callers ask for a [`DeadlockReport`] with
//! [`EntityStore::run_detection`] whenever they want a fresh one.

mod config;
mod cycles;
mod report;
mod snapshot;
mod store;
mod types;
mod wait_for;

pub use config::DetectionConfig;
pub use cycles::{CycleSearch, dedup_cycles, detect, detect_exhaustive, detect_from, detect_shared_visited};
pub use report::DeadlockReport;
pub use snapshot::{EXPORT_FILE_NAME, Snapshot, SnapshotError};
pub use store::EntityStore;
pub use types::{Allocation, Process, ProcessId, Request, Resource, ResourceId};
pub use wait_for::{Adjacency, WaitForEdge, WaitForGraph};
