/// Document models for Taskboard
///
/// # Models
///
/// - `task`: Schema-free task documents keyed by `id`

pub mod task;

pub use task::{NewTask, Task};
