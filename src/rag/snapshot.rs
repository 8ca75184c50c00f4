use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Allocation, Process, Request, Resource};

/// File name the editor offers for exported snapshots.
pub const EXPORT_FILE_NAME: &str = "rag-sim.json";

/// Flat, persistable record of a whole store.
///
/// Every collection is optional on input; fields the core does not know
/// about (node coordinates and the like) are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
	/// Process nodes.
	#[serde(default)]
	pub processes: Vec<Process>,
	/// Resource nodes.
	#[serde(default)]
	pub resources: Vec<Resource>,
	/// Held units, in record order.
	#[serde(default)]
	pub allocations: Vec<Allocation>,
	/// Pending units, in record order.
	#[serde(default)]
	pub requests: Vec<Request>,
}

/// Failure at the JSON boundary. The store is never touched by one.
#[derive(Debug, Error)]
pub enum SnapshotError {
	/// The text is not JSON of the snapshot shape.
	#[error("snapshot is not valid JSON: {0}")]
	Parse(#[source] serde_json::Error),
	/// Serialization failed.
	#[error("snapshot could not be encoded: {0}")]
	Encode(#[source] serde_json::Error),
}

impl Snapshot {
	/// Parses editor JSON, filling absent collections and fields with defaults.
	pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
		serde_json::from_str(text).map_err(SnapshotError::Parse)
	}

	/// Indented JSON as written to [`EXPORT_FILE_NAME`].
	pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
		serde_json::to_string_pretty(self).map_err(SnapshotError::Encode)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::rag::{ProcessId, ResourceId};

	#[test]
	fn reads_the_editor_format() {
		let text = r#"{
			"processes": [{ "id": "P_a", "label": "P1", "x": 300, "y": 200 }],
			"resources": [{ "id": "R_b", "label": "R1", "x": 600, "y": 200, "instances": 2 }],
			"allocations": [{ "resId": "R_b", "procId": "P_a", "count": 1 }],
			"requests": [{ "procId": "P_a", "resId": "R_b", "count": 3 }]
		}"#;
		let snapshot = Snapshot::from_json(text).unwrap();
		assert_eq!(snapshot.processes[0].id, ProcessId::from("P_a"));
		assert_eq!(snapshot.resources[0].instances, 2);
		assert_eq!(snapshot.allocations[0].res_id, ResourceId::from("R_b"));
		assert_eq!(snapshot.requests[0].count, 3);
	}

	#[test]
	fn missing_fields_become_empty() {
		let snapshot = Snapshot::from_json(r#"{ "processes": [{ "id": "P_1" }] }"#).unwrap();
		assert_eq!(snapshot.processes.len(), 1);
		assert_eq!(snapshot.processes[0].label, "");
		assert!(snapshot.resources.is_empty());
		assert!(snapshot.allocations.is_empty());
		assert!(snapshot.requests.is_empty());
		assert_eq!(Snapshot::from_json("{}").unwrap(), Snapshot::default());
	}

	#[test]
	fn record_defaults() {
		let snapshot = Snapshot::from_json(
			r#"{ "resources": [{ "id": "R_1" }], "requests": [{ "procId": "P", "resId": "R_1" }] }"#,
		)
		.unwrap();
		assert_eq!(snapshot.resources[0].instances, 1);
		assert_eq!(snapshot.requests[0].count, 1);
	}

	#[test]
	fn malformed_text_is_a_parse_error() {
		assert!(matches!(
			Snapshot::from_json("{ not json"),
			Err(SnapshotError::Parse(_))
		));
	}

	#[test]
	fn writes_camel_case_keys() {
		let snapshot = Snapshot {
			allocations: vec![Allocation {
				res_id: ResourceId::from("R_1"),
				proc_id: ProcessId::from("P_1"),
				count: 1,
			}],
			..Snapshot::default()
		};
		let text = snapshot.to_json_pretty().unwrap();
		assert!(text.contains("\"resId\": \"R_1\""));
		assert!(text.contains("\"procId\": \"P_1\""));
		assert_eq!(Snapshot::from_json(&text).unwrap(), snapshot);
	}
}
