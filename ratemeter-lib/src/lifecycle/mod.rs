//! Instance registration and the close sequence.

mod registry;
mod state;

pub use registry::{EnvFlags, InstanceId, Registry, RegistryState};
pub use state::{Lifecycle, LifecycleState};
