mod guarded_store;
pub mod json;
mod memory;
mod schedule_store;

pub use guarded_store::GuardedStore;
pub use json::schedule_storage::JsonScheduleStore;
pub use memory::InMemoryScheduleStore;
pub use schedule_store::{ScheduleStore, StoreError};
