//! Concrete `taskgraph_core::tools::Tool` implementations.

pub mod scaffolding;

pub use scaffolding::{CreateDirectoryTool, CreateFileTool, GenerateFileContentTool};
