//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod caldav_calendar_sync_client;
mod disabled_calendar_sync_client;
mod in_memory_unit_of_work;
mod jwt_bearer_token_verifier;
mod postgres_unit_of_work;
mod tokio_shift_sync_queue;

pub use caldav_calendar_sync_client::{CalDavCalendarSyncClient, CalDavConfig};
pub use disabled_calendar_sync_client::DisabledCalendarSyncClient;
pub use in_memory_unit_of_work::{InMemoryUnitOfWork, InMemoryUnitOfWorkFactory};
pub use jwt_bearer_token_verifier::JwtBearerTokenVerifier;
pub use postgres_unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
pub use tokio_shift_sync_queue::TokioShiftSyncQueue;
