//! Execution coordination and trigger registration for hookrun.

pub mod coordinator;
pub mod registration;

pub use coordinator::Coordinator;
pub use registration::TriggerService;
