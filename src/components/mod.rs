//! Editor shell around the allocation graph model.

mod control_panel;
mod editor;
mod rag_canvas;

pub use control_panel::ControlPanel;
pub use editor::EditorState;
pub use rag_canvas::RagCanvas;
