//! Registry of record constructors.
//!
//! Record targets are built from a registered constructor when one exists
//! and from `Default` otherwise. The registry is shared through the result
//! context, so every row of a result sees the same constructors.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type Factory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Constructors keyed by record type.
#[derive(Default)]
pub struct ObjectFactories {
    factories: RwLock<HashMap<TypeId, Factory>>,
}

impl ObjectFactories {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a constructor for `T`, replacing any previous one.
    ///
    /// # Example
    ///
    /// ```
    /// use snowflake_structured_rs::ObjectFactories;
    ///
    /// #[derive(Default)]
    /// struct Point {
    ///     x: i64,
    /// }
    ///
    /// let factories = ObjectFactories::new();
    /// factories.register::<Point, _>(|| Point { x: -1 });
    /// assert!(factories.is_registered::<Point>());
    /// ```
    pub fn register<T, F>(&self, factory: F)
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Box::new(factory()) as Box<dyn Any + Send>);
        let replaced = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), factory)
            .is_some();
        tracing::debug!(
            record = std::any::type_name::<T>(),
            replaced,
            "Registered object factory"
        );
    }

    /// Remove the constructor for `T`. Returns whether one was registered.
    pub fn unregister<T: Any>(&self) -> bool {
        let removed = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<T>())
            .is_some();
        tracing::debug!(
            record = std::any::type_name::<T>(),
            removed,
            "Unregistered object factory"
        );
        removed
    }

    /// Check if a constructor is registered for `T`.
    pub fn is_registered<T: Any>(&self) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no constructor is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a `T` with its registered constructor, if any.
    ///
    /// The lock is released before the constructor runs, so constructors may
    /// use the registry themselves.
    pub(crate) fn create<T: Any>(&self) -> Option<T> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .cloned()?;
        factory().downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for ObjectFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectFactories")
            .field("registered", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i64,
    }

    #[test]
    fn test_register_and_create() {
        let factories = ObjectFactories::new();
        assert!(factories.is_empty());
        assert_eq!(factories.create::<Point>(), None);

        factories.register::<Point, _>(|| Point { x: 7 });
        assert_eq!(factories.len(), 1);
        assert_eq!(factories.create::<Point>(), Some(Point { x: 7 }));
    }

    #[test]
    fn test_last_registration_wins() {
        let factories = ObjectFactories::new();
        factories.register::<Point, _>(|| Point { x: 1 });
        factories.register::<Point, _>(|| Point { x: 2 });
        assert_eq!(factories.len(), 1);
        assert_eq!(factories.create::<Point>(), Some(Point { x: 2 }));
    }

    #[test]
    fn test_unregister() {
        let factories = ObjectFactories::new();
        assert!(!factories.unregister::<Point>());

        factories.register::<Point, _>(Point::default);
        assert!(factories.is_registered::<Point>());
        assert!(factories.unregister::<Point>());
        assert!(!factories.is_registered::<Point>());
        assert_eq!(factories.create::<Point>(), None);
    }

    #[test]
    fn test_concurrent_create() {
        let factories = Arc::new(ObjectFactories::new());
        factories.register::<Point, _>(|| Point { x: 3 });

        std::thread::scope(|s| {
            for _ in 0..8 {
                let factories = Arc::clone(&factories);
                s.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(factories.create::<Point>(), Some(Point { x: 3 }));
                    }
                });
            }
        });
    }
}
