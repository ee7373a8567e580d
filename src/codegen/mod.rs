//! Source file generation from table metadata.
//!
//! The pipeline is: naming → [`ContextBuilder`] (per kind) → [`FileEmitter`]
//! (path resolution, conflict check, render) → [`EmissionLog`]. The
//! [`Generator`] drives it for every requested kind and table.

pub mod context;
pub mod emitter;
pub mod fs_utils;
pub mod orchestration;
pub mod plugins;
pub mod template;

// Re-export key types
pub use context::{ContextBuilder, RenderContext};
pub use emitter::{EmissionLog, FileEmitter};
pub use orchestration::Generator;
pub use plugins::{GenerationHooks, NoOpHooks};
pub use template::{PlaceholderRenderer, TemplateRenderer};
