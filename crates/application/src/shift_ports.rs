mod repository;
mod sync;
mod unit_of_work;

pub use repository::{ShiftRepository, SubscriptionRepository};
pub use sync::{CalendarSyncClient, ShiftSyncCommand, ShiftSyncQueue};
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory, UnitOfWorkState};
