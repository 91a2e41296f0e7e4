//! Level Files and Authoring
//!
//! - `document`: JSON map schema, validation, load/save
//! - `editor`: offline authoring operations

pub mod document;
pub mod editor;

pub use document::{Level, LevelError, LoadReport, MapDocument};
pub use editor::{EditError, LevelEditor, Tool};
