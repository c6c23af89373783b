// Service layer: the dashboard poll/render/digest cycle and the timer loop that drives it.
pub mod dashboard_service;
pub mod scheduler;

pub use dashboard_service::{DashboardService, DigestDelivery};
pub use scheduler::Scheduler;
