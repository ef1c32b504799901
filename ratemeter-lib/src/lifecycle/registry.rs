use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Log target for the registry
const LOG_TARGET: &str = "   registry";

/// Identifies one registered progress instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(u64);

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-wide display settings that GUI meters adjust while they are alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvFlags {
    /// Whether plot windows show a toolbar.
    pub toolbar: bool,

    /// Whether plots redraw interactively.
    pub interactive: bool,
}

impl Default for EnvFlags {
    fn default() -> Self {
        Self {
            toolbar: true,
            interactive: false,
        }
    }
}

/// Everything guarded by the registry lock.
#[derive(Debug, Default)]
pub struct RegistryState {
    instances: BTreeSet<InstanceId>,
    next_id: u64,
    env: EnvFlags,
}

impl RegistryState {
    /// Add a new instance and return its id.
    pub fn add(&mut self) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        let _ = self.instances.insert(id);
        id
    }

    /// Remove `id`; returns `false` if it was not registered.
    pub fn remove(&mut self, id: InstanceId) -> bool {
        self.instances.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains(&id)
    }

    pub fn instances(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.iter().copied()
    }

    #[must_use]
    pub const fn env(&self) -> EnvFlags {
        self.env
    }

    pub const fn env_mut(&mut self) -> &mut EnvFlags {
        &mut self.env
    }
}

/// The set of live progress instances, shared by every meter in the process.
///
/// GUI meters and any sibling progress reporters register here under a single lock,
/// which also guards the shared [`EnvFlags`]. Instances receive the registry explicitly
/// (usually [`Registry::global`]) rather than reaching for ambient state, so tests can
/// use isolated registries.
#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The registry shared by the whole process.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(Self::new))
    }

    /// Lock the registry for a compound update.
    pub fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().expect("lock poisoned")
    }

    /// Register an instance without touching the environment.
    pub fn register(&self) -> InstanceId {
        let id = self.lock().add();
        log::debug!(target: LOG_TARGET, "Registered instance {id}");
        id
    }

    /// Register an instance and adjust the environment in the same critical section.
    ///
    /// Returns the new id and the flags as they were before `adjust` ran.
    pub fn register_with_env(&self, adjust: impl FnOnce(&mut EnvFlags)) -> (InstanceId, EnvFlags) {
        let mut state = self.lock();
        let id = state.add();
        let saved = state.env();
        adjust(state.env_mut());
        log::debug!(target: LOG_TARGET, "Registered instance {id}, saved environment {saved:?}");
        (id, saved)
    }

    /// Remove an instance, optionally restoring saved environment flags, atomically.
    pub fn unregister(&self, id: InstanceId, restore: Option<EnvFlags>) -> bool {
        let mut state = self.lock();
        let removed = state.remove(id);
        if let Some(env) = restore {
            *state.env_mut() = env;
        }
        log::debug!(target: LOG_TARGET, "Unregistered instance {id} (was registered: {removed})");
        removed
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.lock().contains(id)
    }

    /// Snapshot of the live instances, in registration order.
    #[must_use]
    pub fn instances(&self) -> Vec<InstanceId> {
        self.lock().instances().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn env(&self) -> EnvFlags {
        self.lock().env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let registry = Registry::new();
        let a = registry.register();
        let b = registry.register();
        assert_ne!(a, b);
        assert_eq!(registry.instances(), vec![a, b]);

        assert!(registry.unregister(a, None));
        assert!(!registry.unregister(a, None));
        assert_eq!(registry.instances(), vec![b]);
    }

    #[test]
    fn test_env_saved_and_restored() {
        let registry = Registry::new();
        let (id, saved) = registry.register_with_env(|env| {
            env.toolbar = false;
            env.interactive = true;
        });
        assert_eq!(saved, EnvFlags::default());
        assert!(!registry.env().toolbar);
        assert!(registry.env().interactive);

        let _ = registry.unregister(id, Some(saved));
        assert_eq!(registry.env(), EnvFlags::default());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_nested_instances_restore_last_writer() {
        let registry = Registry::new();
        let (outer, outer_saved) = registry.register_with_env(|env| env.toolbar = false);
        let (inner, inner_saved) = registry.register_with_env(|env| env.interactive = true);
        assert!(!inner_saved.toolbar);

        let _ = registry.unregister(inner, Some(inner_saved));
        assert!(!registry.env().toolbar);
        assert!(!registry.env().interactive);

        let _ = registry.unregister(outer, Some(outer_saved));
        assert!(registry.env().toolbar);
    }

    #[test]
    fn test_global_is_shared() {
        let a = Registry::global();
        let b = Registry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_instance_id_display() {
        let registry = Registry::new();
        assert_eq!(registry.register().to_string(), "#0");
    }
}
