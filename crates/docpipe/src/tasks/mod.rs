pub mod taskmaster;
pub mod tracker;

pub use taskmaster::{export_task_list, load_tasks, render_task_list, sync_status, Task, TaskFile};
pub use tracker::{CommandTaskTracker, NoopTaskTracker, TaskTracker};
