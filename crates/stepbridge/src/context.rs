//! Per-scenario mutable state shared by the steps of one scenario.
//!
//! A [`ScenarioContext`] is created when the engine initializes a scenario
//! and dropped when the scenario finishes. Values are stored by name and
//! retrieved by type; a lookup with the wrong type behaves like a miss.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use stepbridge_protocol::Pickle;

/// String-keyed store of opaque values scoped to one scenario execution.
///
/// # Examples
///
/// ```
/// use stepbridge::ScenarioContext;
///
/// let mut ctx = ScenarioContext::default();
/// ctx.set("result", String::from("foobar"));
///
/// assert_eq!(ctx.get::<String>("result").map(String::as_str), Some("foobar"));
/// assert_eq!(ctx.get::<u32>("result"), None);
/// ```
#[derive(Default)]
pub struct ScenarioContext {
    pickle: Option<Pickle>,
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ScenarioContext {
    /// Create an empty context for the given scenario.
    #[must_use]
    pub fn for_pickle(pickle: Pickle) -> Self {
        Self {
            pickle: Some(pickle),
            values: HashMap::new(),
        }
    }

    /// The scenario this context belongs to, when known.
    #[must_use]
    pub const fn pickle(&self) -> Option<&Pickle> {
        self.pickle.as_ref()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Borrow the value stored under `key` if it has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    /// Mutably borrow the value stored under `key` if it has type `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut::<T>()
    }

    /// Remove and return the value stored under `key` if it has type `T`.
    ///
    /// A value of a different type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key).is_some_and(|value| value.is::<T>()) {
            return None;
        }
        let boxed = self.values.remove(key)?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }

    /// Whether a value of any type is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("ScenarioContext")
            .field("scenario", &self.pickle.as_ref().map(|p| p.name.as_str()))
            .field("keys", &keys)
            .finish()
    }
}
