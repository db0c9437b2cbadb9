pub mod schedule_storage;
