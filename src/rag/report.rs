//! The on-demand detection entry point and what the editor renders from it.

use indexmap::IndexSet;
use log::info;
use serde::{Deserialize, Serialize};

use super::config::DetectionConfig;
use super::cycles::{dedup_cycles, detect_from};
use super::store::EntityStore;
use super::types::{Allocation, ProcessId, Request};
use super::wait_for::{WaitForEdge, WaitForGraph};

/// Evidence from one detection run. The default value is the "nothing
/// detected yet" state shown after clearing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlockReport {
	/// Every derived wait-for edge, repeats included.
	pub wait_for_edges: Vec<WaitForEdge>,
	/// Cycles in discovery order.
	pub cycles: Vec<Vec<ProcessId>>,
}

impl DeadlockReport {
	/// True when at least one cycle was found.
	pub fn is_deadlocked(&self) -> bool {
		!self.cycles.is_empty()
	}

	/// Every process that appears in some cycle, in first-appearance order.
	pub fn deadlocked_processes(&self) -> IndexSet<&ProcessId> {
		self.cycles.iter().flatten().collect()
	}

	/// Whether `id` sits on any reported cycle.
	pub fn is_deadlocked_process(&self, id: &ProcessId) -> bool {
		self.cycles.iter().flatten().any(|p| p == id)
	}

	/// Allocations are highlighted by their holder.
	pub fn highlights_allocation(&self, allocation: &Allocation) -> bool {
		self.is_deadlocked_process(&allocation.proc_id)
	}

	/// Requests are highlighted by their requester.
	pub fn highlights_request(&self, request: &Request) -> bool {
		self.is_deadlocked_process(&request.proc_id)
	}
}

impl EntityStore {
	/// Builds the wait-for graph and searches it with the default config.
	pub fn run_detection(&self) -> DeadlockReport {
		self.run_detection_with(&DetectionConfig::default())
	}

	/// Builds the wait-for graph and searches it from the store's processes,
	/// in store order. Unknown ids reachable from a process are walked, but a
	/// cycle made only of unknown ids is not reported.
	pub fn run_detection_with(&self, config: &DetectionConfig) -> DeadlockReport {
		let graph = WaitForGraph::build(self);
		let starts = self.processes().iter().map(|p| &p.id);
		let mut cycles = detect_from(&graph.adjacency, starts, config.search);
		if config.dedup {
			cycles = dedup_cycles(cycles);
		}
		info!(
			"detection ({:?}): {} wait-for edge(s), {} cycle(s)",
			config.search,
			graph.edges.len(),
			cycles.len()
		);
		DeadlockReport {
			wait_for_edges: graph.edges,
			cycles,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::rag::ResourceId;

	/// P1 holds R1 and wants R2, P2 holds R2 and wants R1.
	fn crossed() -> (EntityStore, ProcessId, ProcessId, ResourceId, ResourceId) {
		let mut store = EntityStore::new();
		let p1 = store.add_process(None);
		let p2 = store.add_process(None);
		let r1 = store.add_resource(None, 1);
		let r2 = store.add_resource(None, 1);
		assert!(store.add_allocation(r1.clone(), p1.clone(), 1));
		assert!(store.add_allocation(r2.clone(), p2.clone(), 1));
		store.add_request(p1.clone(), r2.clone(), 1);
		store.add_request(p2.clone(), r1.clone(), 1);
		(store, p1, p2, r1, r2)
	}

	#[test]
	fn crossed_requests_deadlock() {
		let (store, p1, p2, r1, r2) = crossed();
		let report = store.run_detection();
		assert!(report.is_deadlocked());
		assert_eq!(report.cycles, vec![vec![p1.clone(), p2.clone()]]);
		assert_eq!(
			report.wait_for_edges,
			vec![
				WaitForEdge {
					from: p1.clone(),
					to: p2.clone(),
					via: r2,
				},
				WaitForEdge {
					from: p2,
					to: p1,
					via: r1,
				},
			]
		);
	}

	#[test]
	fn highlights_follow_the_process_end() {
		let (mut store, ..) = crossed();
		let bystander = store.add_process(None);
		let spare = store.add_resource(None, 1);
		assert!(store.add_allocation(spare, bystander.clone(), 1));

		let report = store.run_detection();
		assert_eq!(report.deadlocked_processes().len(), 2);
		assert!(!report.is_deadlocked_process(&bystander));
		let highlighted: Vec<bool> = store
			.allocations()
			.iter()
			.map(|a| report.highlights_allocation(a))
			.collect();
		assert_eq!(highlighted, vec![true, true, false]);
		assert!(store.requests().iter().all(|r| report.highlights_request(r)));
	}

	#[test]
	fn dedup_is_applied_when_configured() {
		// Three processes, each holding one resource and wanting the other two.
		let mut store = EntityStore::new();
		let procs: Vec<ProcessId> = (0..3).map(|_| store.add_process(None)).collect();
		let res: Vec<ResourceId> = (0..3).map(|_| store.add_resource(None, 1)).collect();
		for (p, r) in procs.iter().zip(&res) {
			assert!(store.add_allocation(r.clone(), p.clone(), 1));
		}
		for (i, p) in procs.iter().enumerate() {
			for (j, r) in res.iter().enumerate() {
				if i != j {
					store.add_request(p.clone(), r.clone(), 1);
				}
			}
		}

		let plain = store.run_detection_with(&DetectionConfig::exhaustive());
		assert_eq!(plain.cycles.len(), 5);
		let deduped = store.run_detection_with(&DetectionConfig::exhaustive().with_dedup(true));
		assert_eq!(deduped.cycles.len(), 4);
		assert!(!deduped.cycles.contains(&vec![
			procs[0].clone(),
			procs[2].clone(),
			procs[1].clone()
		]));
	}

	#[test]
	fn cleared_report_is_empty() {
		let report = DeadlockReport::default();
		assert!(!report.is_deadlocked());
		assert!(report.deadlocked_processes().is_empty());
	}

	#[test]
	fn serializes_with_editor_keys() {
		let (store, ..) = crossed();
		let value = serde_json::to_value(store.run_detection()).unwrap();
		assert!(value.get("waitForEdges").is_some());
		assert_eq!(value["cycles"].as_array().map(Vec::len), Some(1));
	}
}
