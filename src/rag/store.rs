//! Owned aggregate of processes, resources, allocations and requests.
//!
//! The store is the only place the allocation capacity invariant is enforced:
//! for every resource the allocated units never exceed its instances. Every
//! other inconsistency (dangling ids, over-sized requests) is tolerated and
//! resolved as "not found" by the readers.

use log::{debug, info, warn};

use super::snapshot::Snapshot;
use super::types::{Allocation, Process, ProcessId, Request, Resource, ResourceId};

/// Processes, resources and the allocation/request records between them.
///
/// Equality compares the four collections only.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
	processes: Vec<Process>,
	resources: Vec<Resource>,
	allocations: Vec<Allocation>,
	requests: Vec<Request>,
	next_id: u64,
}

impl PartialEq for EntityStore {
	fn eq(&self, other: &Self) -> bool {
		self.processes == other.processes
			&& self.resources == other.resources
			&& self.allocations == other.allocations
			&& self.requests == other.requests
	}
}

impl Eq for EntityStore {}

impl EntityStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// The editor's starting state: one process `P1` and one single-instance
	/// resource `R1`.
	pub fn with_defaults() -> Self {
		let mut store = Self::new();
		store.add_process(None);
		store.add_resource(None, 1);
		store
	}

	/// Processes in insertion order.
	pub fn processes(&self) -> &[Process] {
		&self.processes
	}

	/// Resources in insertion order.
	pub fn resources(&self) -> &[Resource] {
		&self.resources
	}

	/// Allocation records in insertion order.
	pub fn allocations(&self) -> &[Allocation] {
		&self.allocations
	}

	/// Request records in insertion order.
	pub fn requests(&self) -> &[Request] {
		&self.requests
	}

	/// Looks up a process by id.
	pub fn process(&self, id: &ProcessId) -> Option<&Process> {
		self.processes.iter().find(|p| &p.id == id)
	}

	/// Looks up a resource by id.
	pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
		self.resources.iter().find(|r| &r.id == id)
	}

	/// True when all four collections are empty.
	pub fn is_empty(&self) -> bool {
		self.processes.is_empty()
			&& self.resources.is_empty()
			&& self.allocations.is_empty()
			&& self.requests.is_empty()
	}

	fn contains_id(&self, id: &str) -> bool {
		self.processes.iter().any(|p| p.id.as_str() == id)
			|| self.resources.iter().any(|r| r.id.as_str() == id)
	}

	fn fresh_id(&mut self, prefix: &str) -> String {
		loop {
			self.next_id += 1;
			let candidate = format!("{prefix}_{}", self.next_id);
			if !self.contains_id(&candidate) {
				return candidate;
			}
		}
	}

	/// Adds a process; the label defaults to `P<n>` with `n` the new process
	/// count.
	pub fn add_process(&mut self, label: Option<String>) -> ProcessId {
		let id = ProcessId(self.fresh_id("P"));
		let label = label.unwrap_or_else(|| format!("P{}", self.processes.len() + 1));
		debug!("add process {id} ({label})");
		self.processes.push(Process {
			id: id.clone(),
			label,
		});
		id
	}

	/// Adds a resource with `instances` units; the label defaults to `R<n>`.
	pub fn add_resource(&mut self, label: Option<String>, instances: u32) -> ResourceId {
		let id = ResourceId(self.fresh_id("R"));
		let label = label.unwrap_or_else(|| format!("R{}", self.resources.len() + 1));
		debug!("add resource {id} ({label}) with {instances} instance(s)");
		self.resources.push(Resource {
			id: id.clone(),
			label,
			instances,
		});
		id
	}

	/// Deletes a process together with every allocation and request naming it.
	pub fn remove_process(&mut self, id: &ProcessId) {
		let before = self.processes.len();
		self.processes.retain(|p| &p.id != id);
		self.allocations.retain(|a| &a.proc_id != id);
		self.requests.retain(|r| &r.proc_id != id);
		if self.processes.len() != before {
			debug!("removed process {id}");
		}
	}

	/// Deletes a resource together with every allocation and request naming it.
	pub fn remove_resource(&mut self, id: &ResourceId) {
		let before = self.resources.len();
		self.resources.retain(|r| &r.id != id);
		self.allocations.retain(|a| &a.res_id != id);
		self.requests.retain(|r| &r.res_id != id);
		if self.resources.len() != before {
			debug!("removed resource {id}");
		}
	}

	/// Removes whichever entity owns `id`, processes first.
	pub fn remove_node(&mut self, id: &str) {
		if self.processes.iter().any(|p| p.id.as_str() == id) {
			self.remove_process(&ProcessId::from(id));
		} else {
			self.remove_resource(&ResourceId::from(id));
		}
	}

	/// Renames a process or resource. Returns false if `id` is unknown.
	pub fn set_label(&mut self, id: &str, label: String) -> bool {
		if let Some(p) = self.processes.iter_mut().find(|p| p.id.as_str() == id) {
			p.label = label;
			return true;
		}
		if let Some(r) = self.resources.iter_mut().find(|r| r.id.as_str() == id) {
			r.label = label;
			return true;
		}
		false
	}

	/// Changes a resource's capacity. Rejected when the resource is unknown or
	/// the new capacity is below what is already allocated.
	pub fn set_instances(&mut self, id: &ResourceId, instances: u32) -> bool {
		let allocated = self.total_allocated(id);
		let Some(res) = self.resources.iter_mut().find(|r| &r.id == id) else {
			warn!("capacity change for unknown resource {id} ignored");
			return false;
		};
		if u64::from(instances) < allocated {
			warn!("capacity of {id} cannot drop to {instances}: {allocated} allocated");
			return false;
		}
		debug!("resource {id} capacity {} -> {instances}", res.instances);
		res.instances = instances;
		true
	}

	/// Units of `id` held across all allocation records. Summed in `u64` so
	/// imported records cannot overflow the total.
	pub fn total_allocated(&self, id: &ResourceId) -> u64 {
		self.allocations
			.iter()
			.filter(|a| &a.res_id == id)
			.map(|a| u64::from(a.count))
			.sum()
	}

	/// Unallocated units of `id`; zero for an unknown or over-committed
	/// resource.
	pub fn available_instances(&self, id: &ResourceId) -> u32 {
		let Some(res) = self.resource(id) else {
			return 0;
		};
		u32::try_from(self.total_allocated(id))
			.map_or(0, |allocated| res.instances.saturating_sub(allocated))
	}

	/// Processes named by allocation records of `id`, in record order.
	pub fn holders(&self, id: &ResourceId) -> impl Iterator<Item = &ProcessId> {
		self.allocations
			.iter()
			.filter(move |a| &a.res_id == id)
			.map(|a| &a.proc_id)
	}

	/// Appends an allocation if `count` units are free.
	///
	/// Stricter than a plain `count <= available` check: a zero-unit
	/// allocation is also rejected, as it would name a holder that holds
	/// nothing and make requesters wait on it.
	pub fn add_allocation(&mut self, res_id: ResourceId, proc_id: ProcessId, count: u32) -> bool {
		let available = self.available_instances(&res_id);
		if count == 0 || count > available {
			warn!("allocation of {count} x {res_id} to {proc_id} rejected: {available} available");
			return false;
		}
		debug!("allocate {count} x {res_id} to {proc_id}");
		self.allocations.push(Allocation {
			res_id,
			proc_id,
			count,
		});
		true
	}

	/// Appends a request. Requests are demand, so nothing is checked.
	pub fn add_request(&mut self, proc_id: ProcessId, res_id: ResourceId, count: u32) {
		debug!("{proc_id} requests {count} x {res_id}");
		self.requests.push(Request {
			proc_id,
			res_id,
			count,
		});
	}

	/// Removes the allocation at `index`, if any.
	pub fn remove_allocation(&mut self, index: usize) -> Option<Allocation> {
		(index < self.allocations.len()).then(|| self.allocations.remove(index))
	}

	/// Removes the request at `index`, if any.
	pub fn remove_request(&mut self, index: usize) -> Option<Request> {
		(index < self.requests.len()).then(|| self.requests.remove(index))
	}

	/// Orders two clicked node ids as (resource, process), in either order.
	fn resolve_pair(&self, first: &str, second: &str) -> Option<(ResourceId, ProcessId)> {
		let is_res = |id: &str| self.resources.iter().any(|r| r.id.as_str() == id);
		let is_proc = |id: &str| self.processes.iter().any(|p| p.id.as_str() == id);
		if is_res(first) && is_proc(second) {
			Some((ResourceId::from(first), ProcessId::from(second)))
		} else if is_proc(first) && is_res(second) {
			Some((ResourceId::from(second), ProcessId::from(first)))
		} else {
			None
		}
	}

	/// Commits a one-unit allocation edge drawn between two nodes. Pairs that
	/// are not one resource and one process are discarded.
	pub fn link_allocation(&mut self, first: &str, second: &str) -> bool {
		match self.resolve_pair(first, second) {
			Some((res, proc)) => self.add_allocation(res, proc, 1),
			None => {
				debug!("allocation edge {first} -> {second} discarded");
				false
			}
		}
	}

	/// Commits a one-unit request edge drawn between two nodes.
	pub fn link_request(&mut self, first: &str, second: &str) -> bool {
		match self.resolve_pair(first, second) {
			Some((res, proc)) => {
				self.add_request(proc, res, 1);
				true
			}
			None => {
				debug!("request edge {first} -> {second} discarded");
				false
			}
		}
	}

	/// Drops everything and restarts id generation.
	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// Copies the four collections into a persistable record.
	pub fn snapshot(&self) -> Snapshot {
		Snapshot {
			processes: self.processes.clone(),
			resources: self.resources.clone(),
			allocations: self.allocations.clone(),
			requests: self.requests.clone(),
		}
	}

	/// Replaces the four collections wholesale. No validation is performed.
	pub fn load(&mut self, snapshot: Snapshot) {
		info!(
			"loading snapshot: {} processes, {} resources, {} allocations, {} requests",
			snapshot.processes.len(),
			snapshot.resources.len(),
			snapshot.allocations.len(),
			snapshot.requests.len()
		);
		self.processes = snapshot.processes;
		self.resources = snapshot.resources;
		self.allocations = snapshot.allocations;
		self.requests = snapshot.requests;
	}

	/// A store holding exactly the snapshot's records.
	pub fn from_snapshot(snapshot: Snapshot) -> Self {
		let mut store = Self::new();
		store.load(snapshot);
		store
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn two_by_two() -> (EntityStore, ProcessId, ProcessId, ResourceId, ResourceId) {
		let mut store = EntityStore::new();
		let p1 = store.add_process(None);
		let p2 = store.add_process(None);
		let r1 = store.add_resource(None, 1);
		let r2 = store.add_resource(None, 2);
		(store, p1, p2, r1, r2)
	}

	#[test]
	fn default_labels_are_positional() {
		let (store, p1, p2, r1, _) = two_by_two();
		assert_eq!(store.process(&p1).map(|p| p.label.as_str()), Some("P1"));
		assert_eq!(store.process(&p2).map(|p| p.label.as_str()), Some("P2"));
		assert_eq!(store.resource(&r1).map(|r| r.label.as_str()), Some("R1"));
	}

	#[test]
	fn ids_are_unique_after_load() {
		let mut store = EntityStore::new();
		store.load(Snapshot {
			processes: vec![Process {
				id: ProcessId::from("P_1"),
				label: "imported".into(),
			}],
			..Snapshot::default()
		});
		let fresh = store.add_process(None);
		assert_ne!(fresh, ProcessId::from("P_1"));
		assert_eq!(store.processes().len(), 2);
	}

	#[test]
	fn allocation_is_gated_by_availability() {
		let (mut store, p1, p2, _, r2) = two_by_two();
		assert!(store.add_allocation(r2.clone(), p1.clone(), 1));
		assert!(!store.add_allocation(r2.clone(), p2.clone(), 2));
		assert!(store.add_allocation(r2.clone(), p2, 1));
		assert!(!store.add_allocation(r2.clone(), p1, 1));
		assert_eq!(store.total_allocated(&r2), 2);
		assert_eq!(store.available_instances(&r2), 0);
		assert_eq!(store.allocations().len(), 2);
	}

	#[test]
	fn zero_capacity_never_allocates() {
		let mut store = EntityStore::new();
		let p = store.add_process(None);
		let r = store.add_resource(None, 0);
		assert!(!store.add_allocation(r.clone(), p.clone(), 1));
		assert!(!store.add_allocation(r, p, 0));
		assert!(store.allocations().is_empty());
	}

	#[test]
	fn zero_unit_allocation_is_rejected_even_when_free() {
		let (mut store, p1, _, _, r2) = two_by_two();
		assert!(!store.add_allocation(r2.clone(), p1, 0));
		assert_eq!(store.available_instances(&r2), 2);
		assert!(store.holders(&r2).next().is_none());
	}

	#[test]
	fn imported_counts_past_u32_do_not_overflow() {
		let r = ResourceId::from("R_1");
		let p = ProcessId::from("P_1");
		let store = EntityStore::from_snapshot(Snapshot {
			resources: vec![Resource {
				id: r.clone(),
				label: "R1".into(),
				instances: 1,
			}],
			allocations: vec![
				Allocation {
					res_id: r.clone(),
					proc_id: p.clone(),
					count: u32::MAX,
				},
				Allocation {
					res_id: r.clone(),
					proc_id: p,
					count: 1,
				},
			],
			..Snapshot::default()
		});
		assert_eq!(store.total_allocated(&r), u64::from(u32::MAX) + 1);
		assert_eq!(store.available_instances(&r), 0);
		let mut store = store;
		assert!(!store.set_instances(&r, u32::MAX));
	}

	#[test]
	fn unknown_resource_has_nothing_available() {
		let store = EntityStore::new();
		assert_eq!(store.available_instances(&ResourceId::from("R_404")), 0);
		assert_eq!(store.total_allocated(&ResourceId::from("R_404")), 0);
	}

	#[test]
	fn requests_are_never_checked() {
		let (mut store, p1, _, r1, _) = two_by_two();
		store.add_request(p1.clone(), r1.clone(), 10);
		store.add_request(ProcessId::from("ghost"), ResourceId::from("nowhere"), 1);
		assert_eq!(store.requests().len(), 2);
	}

	#[test]
	fn removing_a_process_cascades() {
		let (mut store, p1, p2, r1, r2) = two_by_two();
		assert!(store.add_allocation(r1.clone(), p1.clone(), 1));
		assert!(store.add_allocation(r2.clone(), p2.clone(), 1));
		store.add_request(p1.clone(), r2.clone(), 1);
		store.add_request(p2.clone(), r1.clone(), 1);

		store.remove_process(&p1);
		assert!(store.process(&p1).is_none());
		assert!(store.allocations().iter().all(|a| a.proc_id != p1));
		assert!(store.requests().iter().all(|r| r.proc_id != p1));
		assert_eq!(store.allocations().len(), 1);
		assert_eq!(store.requests().len(), 1);
	}

	#[test]
	fn removing_a_resource_cascades() {
		let (mut store, p1, p2, r1, _) = two_by_two();
		assert!(store.add_allocation(r1.clone(), p1.clone(), 1));
		store.add_request(p2, r1.clone(), 1);
		store.remove_node(r1.as_str());
		assert!(store.resource(&r1).is_none());
		assert!(store.allocations().is_empty());
		assert!(store.requests().is_empty());
	}

	#[test]
	fn removing_unknown_ids_is_a_no_op() {
		let (mut store, ..) = two_by_two();
		let before = store.clone();
		store.remove_process(&ProcessId::from("nope"));
		store.remove_resource(&ResourceId::from("nope"));
		store.remove_node("nope");
		assert_eq!(store, before);
		assert_eq!(store.remove_allocation(3), None);
		assert_eq!(store.remove_request(0), None);
	}

	#[test]
	fn records_are_removed_by_position() {
		let (mut store, p1, p2, r1, r2) = two_by_two();
		store.add_request(p1.clone(), r1.clone(), 1);
		store.add_request(p2.clone(), r2.clone(), 1);
		let removed = store.remove_request(0);
		assert_eq!(removed.map(|r| r.proc_id), Some(p1));
		assert_eq!(store.requests()[0].proc_id, p2);
	}

	#[test]
	fn capacity_cannot_drop_below_allocated() {
		let (mut store, p1, p2, _, r2) = two_by_two();
		assert!(store.add_allocation(r2.clone(), p1, 1));
		assert!(store.add_allocation(r2.clone(), p2, 1));
		assert!(!store.set_instances(&r2, 1));
		assert!(store.set_instances(&r2, 5));
		assert_eq!(store.available_instances(&r2), 3);
		assert!(!store.set_instances(&ResourceId::from("missing"), 1));
	}

	#[test]
	fn links_resolve_either_direction() {
		let (mut store, p1, p2, r1, r2) = two_by_two();
		assert!(store.link_allocation(p1.as_str(), r1.as_str()));
		assert!(store.link_allocation(r2.as_str(), p2.as_str()));
		assert!(store.link_request(r1.as_str(), p2.as_str()));
		assert_eq!(store.allocations()[0].proc_id, p1);
		assert_eq!(store.allocations()[1].res_id, r2);
		assert_eq!(store.requests()[0].proc_id, p2);
		assert_eq!(store.requests()[0].res_id, r1);
	}

	#[test]
	fn links_between_same_kinds_are_discarded() {
		let (mut store, p1, p2, r1, r2) = two_by_two();
		let before = store.clone();
		assert!(!store.link_allocation(p1.as_str(), p2.as_str()));
		assert!(!store.link_request(r1.as_str(), r2.as_str()));
		assert!(!store.link_request(p1.as_str(), "ghost"));
		assert_eq!(store, before);
	}

	#[test]
	fn relabel_and_clear() {
		let (mut store, p1, _, r1, _) = two_by_two();
		assert!(store.set_label(p1.as_str(), "editor".into()));
		assert!(store.set_label(r1.as_str(), "printer".into()));
		assert!(!store.set_label("none", "x".into()));
		assert_eq!(store.process(&p1).map(|p| p.label.as_str()), Some("editor"));
		store.clear();
		assert!(store.is_empty());
	}
}
