use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a process node.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub String);

/// Identifier of a resource node.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ProcessId {
	/// Borrows the raw id string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl ResourceId {
	/// Borrows the raw id string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ProcessId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ProcessId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<&str> for ResourceId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

fn one() -> u32 {
	1
}

/// A process node. Identity only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
	/// Unique id.
	pub id: ProcessId,
	/// Display name.
	#[serde(default)]
	pub label: String,
}

/// A resource type with a fixed number of interchangeable instances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
	/// Unique id.
	pub id: ResourceId,
	/// Display name.
	#[serde(default)]
	pub label: String,
	/// Total units of this resource. Zero means it can never be allocated.
	#[serde(default = "one")]
	pub instances: u32,
}

/// `count` units of `res_id` currently held by `proc_id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
	/// Resource the units belong to.
	pub res_id: ResourceId,
	/// Holder.
	pub proc_id: ProcessId,
	/// Units held.
	#[serde(default = "one")]
	pub count: u32,
}

/// `proc_id` is waiting for `count` more units of `res_id`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	/// Waiting process.
	pub proc_id: ProcessId,
	/// Resource waited on.
	pub res_id: ResourceId,
	/// Units wanted. Not consulted by detection.
	#[serde(default = "one")]
	pub count: u32,
}
