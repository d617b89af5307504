pub mod registry;
pub mod render;
pub mod task;

pub use registry::{DocKind, DocSpec, TemplateRegistry};
pub use render::{placeholders, render_template};
pub use task::{GenerationTask, TARGET_KEY};
