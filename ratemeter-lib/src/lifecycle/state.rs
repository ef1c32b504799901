use super::{EnvFlags, InstanceId, Registry};
use std::sync::Arc;
use strum::Display;

const LOG_TARGET: &str = "  lifecycle";

/// Where an instance is in its one-way life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleState {
    Active,
    Closing,
    Closed,
}

/// Registration plus the `Active → Closing → Closed` state machine for one instance.
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
    id: InstanceId,
    registry: Arc<Registry>,
    saved_env: Option<EnvFlags>,
}

impl Lifecycle {
    /// Register a new instance that leaves the environment alone.
    #[must_use]
    pub fn register(registry: Arc<Registry>) -> Self {
        let id = registry.register();
        Self {
            state: LifecycleState::Active,
            id,
            registry,
            saved_env: None,
        }
    }

    /// Register a new instance that adjusts the shared environment while alive.
    ///
    /// The flags seen before `adjust` are restored when the instance starts closing.
    #[must_use]
    pub fn register_with_env(registry: Arc<Registry>, adjust: impl FnOnce(&mut EnvFlags)) -> Self {
        let (id, saved) = registry.register_with_env(adjust);
        Self {
            state: LifecycleState::Active,
            id,
            registry,
            saved_env: Some(saved),
        }
    }

    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Move from `Active` to `Closing`.
    ///
    /// The instance leaves the registry and the environment is restored before this
    /// returns. Returns `false`, doing nothing, if closing already started.
    pub fn begin_close(&mut self) -> bool {
        if self.state != LifecycleState::Active {
            log::trace!(target: LOG_TARGET, "Instance {} already {}", self.id, self.state);
            return false;
        }

        self.state = LifecycleState::Closing;
        let _ = self.registry.unregister(self.id, self.saved_env.take());
        log::debug!(target: LOG_TARGET, "Instance {} closing", self.id);
        true
    }

    /// Move from `Closing` to `Closed` once the surface is torn down or left showing.
    pub fn finish_close(&mut self) {
        if self.state == LifecycleState::Closing {
            self.state = LifecycleState::Closed;
            log::debug!(target: LOG_TARGET, "Instance {} closed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_runs_once() {
        let registry = Registry::new();
        let mut lifecycle = Lifecycle::register(Arc::clone(&registry));
        assert!(registry.contains(lifecycle.id()));

        assert!(lifecycle.begin_close());
        assert_eq!(lifecycle.state(), LifecycleState::Closing);
        assert!(!registry.contains(lifecycle.id()));

        assert!(!lifecycle.begin_close());
        lifecycle.finish_close();
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
        assert!(!lifecycle.begin_close());
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
    }

    #[test]
    fn test_finish_requires_closing() {
        let registry = Registry::new();
        let mut lifecycle = Lifecycle::register(registry);
        lifecycle.finish_close();
        assert_eq!(lifecycle.state(), LifecycleState::Active);
    }

    #[test]
    fn test_env_restored_on_close() {
        let registry = Registry::new();
        let mut lifecycle = Lifecycle::register_with_env(Arc::clone(&registry), |env| env.toolbar = false);
        assert!(!registry.env().toolbar);

        let _ = lifecycle.begin_close();
        assert!(registry.env().toolbar);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LifecycleState::Closing.to_string(), "closing");
    }
}
