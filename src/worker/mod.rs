pub mod monitor_worker;
pub mod scheduler_state;

pub use monitor_worker::{Collaborators, MonitorWorker, SkipReason, TickReport, DETECTION_CATEGORY};
pub use scheduler_state::SchedulerState;
