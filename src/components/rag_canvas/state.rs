use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::rag::{DeadlockReport, EntityStore};

pub const PROCESS_RADIUS: f64 = 14.0;
pub const RESOURCE_HALF: f64 = 13.0;
pub const HIT_RADIUS: f64 = 18.0;
/// Pointer travel, in screen pixels, below which a press on a node is a click.
pub const CLICK_SLOP: f64 = 4.0;

pub const PROCESS_COLOR: &str = "#e8ecf4";
pub const DEADLOCK_COLOR: &str = "#ff5a5a";
pub const RESOURCE_COLOR: &str = "#9aa4b8";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeKind {
	#[default]
	Process,
	Resource,
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
	/// Free/total instances for resources.
	pub detail: Option<String>,
	pub deadlocked: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub struct RagCanvasState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub selected: Option<String>,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
}

fn simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 400.0,
		force_spring: 0.04,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.85,
	})
}

impl RagCanvasState {
	pub fn new(store: &EntityStore, report: &DeadlockReport, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: simulation(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			selected: None,
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		};
		state.sync(store, report);
		state
	}

	/// Rebuilds the simulation from the store. Nodes that already existed
	/// keep their position and anchoring; new ones are placed on a ring.
	pub fn sync(&mut self, store: &EntityStore, report: &DeadlockReport) {
		let mut positions: HashMap<String, (f32, f32, bool)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.id.clone(),
				(node.x(), node.y(), node.data.is_anchor),
			);
		});

		let processes = store.processes().iter().map(|p| NodeInfo {
			id: p.id.to_string(),
			label: p.label.clone(),
			kind: NodeKind::Process,
			detail: None,
			deadlocked: report.is_deadlocked_process(&p.id),
		});
		let resources = store.resources().iter().map(|r| NodeInfo {
			id: r.id.to_string(),
			label: r.label.clone(),
			kind: NodeKind::Resource,
			detail: Some(format!("{}/{}", store.available_instances(&r.id), r.instances)),
			deadlocked: false,
		});
		let infos: Vec<NodeInfo> = processes.chain(resources).collect();

		let mut graph = simulation();
		let mut id_to_idx = HashMap::new();
		let count = infos.len().max(1) as f64;
		for (i, info) in infos.into_iter().enumerate() {
			let (x, y, is_anchor) = positions.get(&info.id).copied().unwrap_or_else(|| {
				let angle = (i as f64) * 2.0 * PI / count;
				(
					(120.0 * angle.cos()) as f32,
					(120.0 * angle.sin()) as f32,
					false,
				)
			});
			let id = info.id.clone();
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor,
				user_data: info,
			});
			id_to_idx.insert(id, idx);
		}

		// Duplicate records share one drawn edge.
		let mut seen = HashSet::new();
		let allocations = store
			.allocations()
			.iter()
			.map(|a| (a.res_id.as_str(), a.proc_id.as_str()));
		let requests = store
			.requests()
			.iter()
			.map(|r| (r.proc_id.as_str(), r.res_id.as_str()));
		for (from, to) in allocations.chain(requests) {
			if let (Some(&src), Some(&tgt)) = (id_to_idx.get(from), id_to_idx.get(to)) {
				if seen.insert((from, to)) {
					graph.add_edge(src, tgt, EdgeData::default());
				}
			}
		}

		self.graph = graph;
		self.drag = DragState::default();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<String> {
		let mut id = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				id = Some(node.data.user_data.id.clone());
			}
		});
		id
	}

	pub fn is_selected(&self, info: &NodeInfo) -> bool {
		self.selected.as_deref() == Some(info.id.as_str())
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
