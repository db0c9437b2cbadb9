mod registry;

pub use registry::{Dashboard, RegistryError, ScheduleRegistry, ToggleOutcome};
