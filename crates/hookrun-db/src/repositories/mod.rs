//! Repository implementations for PostgreSQL.

mod execution;
mod secret;
mod trigger;

pub use execution::PgExecutionRepository;
pub use secret::PgSecretStore;
pub use trigger::PgTriggerRepository;

