//! Instance registry: the construction primitive behind every exercise.
//!
//! The registry maps a type identity to the single live instance of that
//! type and hands out `Arc` clones of it. Construction is lazy and happens
//! exactly once per type, no matter how many threads race for it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;

/// Type-erased storage slot for one singleton instance.
type Entry = Arc<dyn Any + Send + Sync>;

/// A keyed store of lazily constructed singletons.
///
/// Lookups use double-checked locking: a shared read probe first, and only
/// on a miss the exclusive write lock with a re-check before the factory
/// runs. After first construction every caller goes through the read path.
#[derive(Default)]
pub struct InstanceRegistry {
    entries: RwLock<HashMap<TypeId, Entry>>,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the shared instance of `T`, constructing it with `factory`
    /// on the first request only.
    ///
    /// Every caller receives a clone of the same `Arc`, so handles compare
    /// equal under [`Arc::ptr_eq`].
    pub fn get_or_init<T, F>(&self, factory: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        match self.try_get_or_init::<T, Infallible, _>(|| Ok(factory())) {
            Ok(instance) => instance,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_init`](Self::get_or_init).
    ///
    /// If `factory` fails, nothing is stored, the lock is released on the
    /// way out, and the error is returned to the caller as-is. A later call
    /// retries construction.
    pub fn try_get_or_init<T, E, F>(&self, factory: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        let key = TypeId::of::<T>();

        // First check: shared access only. This is the steady-state path
        // once the instance exists.
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(instance) = entries.get(&key).cloned().and_then(downcast::<T>) {
                return Ok(instance);
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        // Second check under the write lock: another thread may have won
        // the race between our two acquisitions.
        if let Some(instance) = entries.get(&key).cloned().and_then(downcast::<T>) {
            return Ok(instance);
        }

        // Still absent. The factory runs while we hold the lock, so a
        // concurrent caller blocks on the read probe above until the entry
        // is either stored or the factory has failed.
        let instance = Arc::new(factory()?);
        entries.insert(key, instance.clone());
        Ok(instance)
    }

    /// Returns the instance of `T` if one has been constructed.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&TypeId::of::<T>()).cloned().and_then(downcast::<T>)
    }

    /// Whether an instance of `T` is currently registered.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(&TypeId::of::<T>())
    }

    /// Drops the entry for `T`, so the next request constructs a fresh
    /// instance. Test support for isolating phases; returns whether an
    /// entry existed.
    ///
    /// Removal takes the write lock, so it cannot interleave with an
    /// in-flight `get_or_init` for the same key.
    pub fn reset<T: Send + Sync + 'static>(&self) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&TypeId::of::<T>()).is_some()
    }

    /// Drops every entry. Test support for isolating phases.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    /// Number of live singletons.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    /// Whether the registry holds no instances.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recovers the concrete type from a type-erased entry. The map is private
/// and only `try_get_or_init::<T>` writes under `TypeId::of::<T>()`, so a
/// mismatch behaves like an absent entry.
fn downcast<T: Send + Sync + 'static>(entry: Entry) -> Option<Arc<T>> {
    entry.downcast::<T>().ok()
}

// =============================================================================
// Process-wide registry
// =============================================================================

lazy_static! {
    static ref GLOBAL_REGISTRY: InstanceRegistry = InstanceRegistry::new();
}

/// The process-wide registry shared by all exercises.
pub fn global() -> &'static InstanceRegistry {
    &GLOBAL_REGISTRY
}

/// Returns the process-wide singleton of `T`, constructing it on first use.
pub fn get_instance<T, F>(factory: F) -> Arc<T>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> T,
{
    GLOBAL_REGISTRY.get_or_init(factory)
}

/// Fallible variant of [`get_instance`]; the factory's error propagates
/// unchanged and nothing is stored on failure.
pub fn try_get_instance<T, E, F>(factory: F) -> Result<Arc<T>, E>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T, E>,
{
    GLOBAL_REGISTRY.try_get_or_init(factory)
}

/// Drops the process-wide instance of `T`. Test support.
pub fn reset_instance<T: Send + Sync + 'static>() -> bool {
    GLOBAL_REGISTRY.reset::<T>()
}
