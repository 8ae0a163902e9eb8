pub mod store;
pub use store::{ApprovalQueue, LeadStore, StageRegistry};
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod stage_repo;
pub use stage_repo::{CachedStageRegistry, StageRepository};
pub mod change_request_repo;
pub use change_request_repo::ChangeRequestRepository;

#[cfg(test)]
pub mod memory;
