pub mod config;
pub mod document;
pub mod docx;
pub mod registry;
pub mod renderer;
pub mod warning;

pub use config::{ConfigError, RenderConfig};
pub use document::{Document, Node};
pub use docx::{DocxError, MediaStore, write_docx};
pub use registry::StyleRegistry;
pub use renderer::{Rendered, render};
pub use warning::Warning;
