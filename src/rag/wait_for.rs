//! Derivation of the process-to-process wait-for graph.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::store::EntityStore;
use super::types::{ProcessId, ResourceId};

/// `from` is blocked on `via`, which `to` holds with no instance left free.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitForEdge {
	/// Blocked process.
	pub from: ProcessId,
	/// Holder it waits on.
	pub to: ProcessId,
	/// Resource with no free instance.
	pub via: ResourceId,
}

/// Adjacency in first-derivation order.
pub type Adjacency = IndexMap<ProcessId, IndexSet<ProcessId>>;

/// Process-to-process graph derived from a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaitForGraph {
	/// Each process and its distinct wait targets.
	pub adjacency: Adjacency,
	/// Every derived edge, including repeats from duplicate records.
	pub edges: Vec<WaitForEdge>,
}

impl WaitForGraph {
	/// Builds the graph from the store's current allocations and requests.
	///
	/// Every known process gets a node, even when isolated. A request blocks
	/// only when its resource has no free instance; it then waits on every
	/// holder of that resource, itself included.
	pub fn build(store: &EntityStore) -> Self {
		let mut adjacency: Adjacency = store
			.processes()
			.iter()
			.map(|p| (p.id.clone(), IndexSet::new()))
			.collect();
		let mut edges = Vec::new();

		for req in store.requests() {
			if store.available_instances(&req.res_id) > 0 {
				continue;
			}
			for holder in store.holders(&req.res_id) {
				adjacency
					.entry(req.proc_id.clone())
					.or_default()
					.insert(holder.clone());
				edges.push(WaitForEdge {
					from: req.proc_id.clone(),
					to: holder.clone(),
					via: req.res_id.clone(),
				});
			}
		}

		Self { adjacency, edges }
	}

	/// Whether `from` waits on `to`.
	pub fn has_edge(&self, from: &ProcessId, to: &ProcessId) -> bool {
		self.adjacency
			.get(from)
			.is_some_and(|targets| targets.contains(to))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn isolated_processes_are_nodes() {
		let mut store = EntityStore::new();
		let p1 = store.add_process(None);
		let p2 = store.add_process(None);
		let graph = WaitForGraph::build(&store);
		assert_eq!(graph.adjacency.keys().collect::<Vec<_>>(), vec![&p1, &p2]);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn free_instance_means_no_wait() {
		let mut store = EntityStore::new();
		let p1 = store.add_process(None);
		let p2 = store.add_process(None);
		let r = store.add_resource(None, 2);
		assert!(store.add_allocation(r.clone(), p1, 1));
		store.add_request(p2, r, 1);
		let graph = WaitForGraph::build(&store);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn waits_on_every_holder() {
		let mut store = EntityStore::new();
		let p1 = store.add_process(None);
		let p2 = store.add_process(None);
		let p3 = store.add_process(None);
		let r = store.add_resource(None, 3);
		assert!(store.add_allocation(r.clone(), p1.clone(), 1));
		assert!(store.add_allocation(r.clone(), p2.clone(), 1));
		assert!(store.add_allocation(r.clone(), p1.clone(), 1));
		store.add_request(p3.clone(), r.clone(), 1);

		let graph = WaitForGraph::build(&store);
		assert_eq!(graph.edges.len(), 3);
		assert_eq!(
			graph.adjacency[&p3].iter().collect::<Vec<_>>(),
			vec![&p1, &p2]
		);
		assert!(graph.edges.iter().all(|e| e.from == p3 && e.via == r));
	}

	#[test]
	fn a_holder_can_wait_on_itself() {
		let mut store = EntityStore::new();
		let p = store.add_process(None);
		let r = store.add_resource(None, 1);
		assert!(store.add_allocation(r.clone(), p.clone(), 1));
		store.add_request(p.clone(), r.clone(), 1);
		let graph = WaitForGraph::build(&store);
		assert!(graph.has_edge(&p, &p));
		assert_eq!(
			graph.edges,
			vec![WaitForEdge {
				from: p.clone(),
				to: p,
				via: r,
			}]
		);
	}

	#[test]
	fn dangling_requester_still_gets_an_entry() {
		let mut store = EntityStore::new();
		let p = store.add_process(None);
		let r = store.add_resource(None, 1);
		assert!(store.add_allocation(r.clone(), p.clone(), 1));
		let ghost = ProcessId::from("ghost");
		store.add_request(ghost.clone(), r, 1);
		let graph = WaitForGraph::build(&store);
		assert!(graph.has_edge(&ghost, &p));
	}

	#[test]
	fn unknown_resource_blocks_without_holders() {
		let mut store = EntityStore::new();
		let p = store.add_process(None);
		store.add_request(p, ResourceId::from("gone"), 1);
		assert!(WaitForGraph::build(&store).edges.is_empty());
	}
}
