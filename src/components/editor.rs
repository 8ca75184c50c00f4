use crate::rag::EntityStore;

/// What a click on a node does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
	#[default]
	Select,
	AddAllocation,
	AddRequest,
	Delete,
}

impl EditMode {
	pub const ALL: [EditMode; 4] = [
		EditMode::Select,
		EditMode::AddAllocation,
		EditMode::AddRequest,
		EditMode::Delete,
	];

	pub fn label(self) -> &'static str {
		match self {
			EditMode::Select => "Select",
			EditMode::AddAllocation => "Add Allocation",
			EditMode::AddRequest => "Add Request",
			EditMode::Delete => "Delete",
		}
	}
}

/// Click-driven editing state: the active mode, the first endpoint of an edge
/// being drawn, and the selected node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorState {
	pub mode: EditMode,
	pub edge_step: Option<String>,
	pub selected: Option<String>,
}

impl EditorState {
	pub fn set_mode(&mut self, mode: EditMode) {
		self.mode = mode;
		self.edge_step = None;
	}

	/// Forgets the pending edge and selection, keeping the mode.
	pub fn reset(&mut self) {
		self.edge_step = None;
		self.selected = None;
	}

	/// Applies a click on node `id`. In the edge modes the first click only
	/// remembers the source; the second commits the edge (or silently drops
	/// it) and clears the step either way.
	pub fn click(&mut self, store: &mut EntityStore, id: &str) {
		match self.mode {
			EditMode::Select => self.selected = Some(id.to_owned()),
			EditMode::AddAllocation | EditMode::AddRequest => match self.edge_step.take() {
				None => self.edge_step = Some(id.to_owned()),
				Some(source) if self.mode == EditMode::AddAllocation => {
					store.link_allocation(&source, id);
				}
				Some(source) => {
					store.link_request(&source, id);
				}
			},
			EditMode::Delete => {
				store.remove_node(id);
				if self.selected.as_deref() == Some(id) {
					self.selected = None;
				}
			}
		}
	}
}
