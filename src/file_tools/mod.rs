//! File tools: workspace-confined file access
//!
//! All operations use the real filesystem.

pub mod file_edit;
pub mod file_read;
pub mod workspace;

pub use file_edit::{insert_lines, EditMode, FileEditTool};
pub use file_read::FileReadTool;
pub use workspace::{expand_home, normalize_lexically, resolve_path};
