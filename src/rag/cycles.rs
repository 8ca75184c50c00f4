//! Cycle search over a wait-for adjacency.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::types::ProcessId;
use super::wait_for::Adjacency;

/// Strategy used to enumerate cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleSearch {
	/// One depth-first pass with a `visited` set shared by every start node.
	/// Cheap, but a cycle reachable only through an already explored node is
	/// not reported again, so enumeration can be incomplete.
	#[default]
	SharedVisited,
	/// Every elementary cycle exactly once, rooted at its earliest node.
	/// Exponential in the worst case.
	Exhaustive,
}

/// Runs the given search from every adjacency key. Cycles come back in
/// discovery order; each one lists its nodes along the edges, the last node
/// having an edge to the first.
pub fn detect(adjacency: &Adjacency, search: CycleSearch) -> Vec<Vec<ProcessId>> {
	detect_from(adjacency, adjacency.keys(), search)
}

/// Runs the given search rooted only at `starts`, in that order. Starts that
/// are not adjacency keys are ignored. Nodes outside `starts` are still walked
/// when an edge reaches them, but a cycle made only of such nodes is never
/// reported.
pub fn detect_from<'s>(
	adjacency: &Adjacency,
	starts: impl IntoIterator<Item = &'s ProcessId>,
	search: CycleSearch,
) -> Vec<Vec<ProcessId>> {
	let starts: Vec<&ProcessId> = starts
		.into_iter()
		.filter_map(|id| adjacency.get_key_value(id).map(|(key, _)| key))
		.collect();
	match search {
		CycleSearch::SharedVisited => shared_visited(adjacency, &starts),
		CycleSearch::Exhaustive => exhaustive(adjacency, &starts),
	}
}

struct SharedVisited<'a> {
	adjacency: &'a Adjacency,
	visited: HashSet<&'a ProcessId>,
	on_stack: HashSet<&'a ProcessId>,
	path: Vec<&'a ProcessId>,
	cycles: Vec<Vec<ProcessId>>,
}

impl<'a> SharedVisited<'a> {
	fn visit(&mut self, node: &'a ProcessId) {
		if self.on_stack.contains(node) {
			if let Some(start) = self.path.iter().position(|n| *n == node) {
				self.cycles
					.push(self.path[start..].iter().map(|n| (*n).clone()).collect());
			}
			return;
		}
		if !self.visited.insert(node) {
			return;
		}
		self.on_stack.insert(node);
		self.path.push(node);

		let adjacency = self.adjacency;
		if let Some(targets) = adjacency.get(node) {
			for next in targets {
				self.visit(next);
			}
		}

		self.path.pop();
		self.on_stack.remove(node);
	}
}

/// Classic DFS with an on-stack marker, not deduplicated.
pub fn detect_shared_visited(adjacency: &Adjacency) -> Vec<Vec<ProcessId>> {
	let starts: Vec<&ProcessId> = adjacency.keys().collect();
	shared_visited(adjacency, &starts)
}

fn shared_visited<'a>(
	adjacency: &'a Adjacency,
	starts: &[&'a ProcessId],
) -> Vec<Vec<ProcessId>> {
	let mut search = SharedVisited {
		adjacency,
		visited: HashSet::new(),
		on_stack: HashSet::new(),
		path: Vec::new(),
		cycles: Vec::new(),
	};
	for &node in starts {
		if !search.visited.contains(node) {
			search.visit(node);
		}
	}
	search.cycles
}

/// Enumerates all elementary cycles by backtracking over simple paths.
pub fn detect_exhaustive(adjacency: &Adjacency) -> Vec<Vec<ProcessId>> {
	let starts: Vec<&ProcessId> = adjacency.keys().collect();
	exhaustive(adjacency, &starts)
}

/// Nodes are ranked starts first, then the remaining keys, then targets that
/// never appear as a key. The walk from a root only enters nodes of higher
/// rank, so each cycle is found once, from its lowest ranked member, and only
/// cycles touching some start are found.
fn exhaustive<'a>(
	adjacency: &'a Adjacency,
	starts: &[&'a ProcessId],
) -> Vec<Vec<ProcessId>> {
	let mut order: IndexSet<&ProcessId> = starts.iter().copied().collect();
	let roots = order.len();
	order.extend(adjacency.keys());
	order.extend(adjacency.values().flatten());

	let mut cycles = Vec::new();
	for (rank, start) in order.iter().take(roots).enumerate() {
		let mut path = vec![*start];
		let mut on_path = HashSet::from([*start]);
		walk(adjacency, &order, rank, &mut path, &mut on_path, &mut cycles);
	}
	cycles
}

fn walk<'a>(
	adjacency: &'a Adjacency,
	order: &IndexSet<&'a ProcessId>,
	min_rank: usize,
	path: &mut Vec<&'a ProcessId>,
	on_path: &mut HashSet<&'a ProcessId>,
	cycles: &mut Vec<Vec<ProcessId>>,
) {
	let (Some(&start), Some(&current)) = (path.first(), path.last()) else {
		return;
	};
	let Some(targets) = adjacency.get(current) else {
		return;
	};
	for next in targets {
		if order.get_index_of(next).is_none_or(|rank| rank < min_rank) {
			continue;
		}
		if next == start {
			cycles.push(path.iter().map(|n| (*n).clone()).collect());
		} else if on_path.insert(next) {
			path.push(next);
			walk(adjacency, order, min_rank, path, on_path, cycles);
			path.pop();
			on_path.remove(next);
		}
	}
}

/// Keeps the first cycle of every distinct node set.
pub fn dedup_cycles(cycles: Vec<Vec<ProcessId>>) -> Vec<Vec<ProcessId>> {
	let mut seen = HashSet::new();
	cycles
		.into_iter()
		.filter(|cycle| {
			let mut key = cycle.clone();
			key.sort();
			seen.insert(key)
		})
		.collect()
}
