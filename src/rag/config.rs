use serde::{Deserialize, Serialize};

use super::cycles::CycleSearch;

/// Knobs for a detection run. The default reproduces the single shared-visited
/// DFS pass with every discovered cycle kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
	/// Which cycle search to run.
	pub search: CycleSearch,
	/// Drop cycles whose node set was already reported.
	pub dedup: bool,
}

impl DetectionConfig {
	/// Exhaustive search, duplicates kept.
	pub fn exhaustive() -> Self {
		Self {
			search: CycleSearch::Exhaustive,
			dedup: false,
		}
	}

	/// Builder-style toggle for [`DetectionConfig::dedup`].
	pub fn with_dedup(mut self, dedup: bool) -> Self {
		self.dedup = dedup;
		self
	}
}
