//! Concurrent registry of live scenario contexts.
//!
//! A scenario is present from the moment its initialization is acknowledged
//! until the coordinator processes its completion. Each context sits behind
//! its own mutex so steps of different scenarios never contend.

use std::sync::{Arc, Mutex};

use dashmap::{DashMap, mapref::entry::Entry};

use stepbridge_protocol::ScenarioId;

use crate::{ScenarioContext, error::ScenarioStateError};

/// Shared handle to one scenario's context.
pub type SharedContext = Arc<Mutex<ScenarioContext>>;

/// Concurrent map from scenario identifier to its context.
#[derive(Debug, Default)]
pub struct ScenarioStates(DashMap<ScenarioId, SharedContext>);

impl ScenarioStates {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `context` for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioStateError::DuplicateScenario`] when `id` is already
    /// registered; the existing context is left untouched.
    pub fn create(
        &self,
        id: ScenarioId,
        context: ScenarioContext,
    ) -> Result<SharedContext, ScenarioStateError> {
        match self.0.entry(id) {
            Entry::Occupied(entry) => Err(ScenarioStateError::DuplicateScenario(entry.key().clone())),
            Entry::Vacant(entry) => {
                let shared = Arc::new(Mutex::new(context));
                entry.insert(Arc::clone(&shared));
                Ok(shared)
            }
        }
    }

    /// Fetch the context registered for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioStateError::UnknownScenario`] when `id` is not
    /// registered.
    pub fn get(&self, id: &ScenarioId) -> Result<SharedContext, ScenarioStateError> {
        self.0
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ScenarioStateError::UnknownScenario(id.clone()))
    }

    /// Drop the context registered for `id`. Removing an absent scenario is a
    /// no-op.
    pub fn remove(&self, id: &ScenarioId) -> bool {
        self.0.remove(id).is_some()
    }

    /// Number of registered scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no scenarios are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove every remaining context and return the identifiers removed.
    pub fn drain(&self) -> Vec<ScenarioId> {
        let mut ids = Vec::with_capacity(self.0.len());
        self.0.retain(|id, _| {
            ids.push(id.clone());
            false
        });
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn states() -> ScenarioStates {
        ScenarioStates::new()
    }

    #[rstest]
    fn create_then_get_returns_same_context(states: ScenarioStates) {
        let id = ScenarioId::from("s1");
        let created = states
            .create(id.clone(), ScenarioContext::default())
            .unwrap_or_else(|e| panic!("create: {e}"));
        let fetched = states.get(&id).unwrap_or_else(|e| panic!("get: {e}"));
        assert!(Arc::ptr_eq(&created, &fetched));
    }

    #[rstest]
    fn duplicate_create_is_rejected(states: ScenarioStates) {
        let id = ScenarioId::from("s1");
        let _ = states.create(id.clone(), ScenarioContext::default());
        let result = states.create(id.clone(), ScenarioContext::default());
        assert_eq!(result.err(), Some(ScenarioStateError::DuplicateScenario(id)));
        assert_eq!(states.len(), 1);
    }

    #[rstest]
    fn unknown_scenario_is_reported(states: ScenarioStates) {
        let id = ScenarioId::from("missing");
        assert_eq!(
            states.get(&id).err(),
            Some(ScenarioStateError::UnknownScenario(id))
        );
    }

    #[rstest]
    fn remove_is_idempotent(states: ScenarioStates) {
        let id = ScenarioId::from("s1");
        let _ = states.create(id.clone(), ScenarioContext::default());
        assert!(states.remove(&id));
        assert!(!states.remove(&id));
        assert!(states.is_empty());
    }

    #[rstest]
    fn drain_clears_and_lists_leftovers(states: ScenarioStates) {
        for name in ["b", "a"] {
            let _ = states.create(ScenarioId::from(name), ScenarioContext::default());
        }
        assert_eq!(
            states.drain(),
            vec![ScenarioId::from("a"), ScenarioId::from("b")]
        );
        assert!(states.is_empty());
    }

    #[test]
    fn concurrent_creates_of_distinct_ids_all_land() {
        let states = Arc::new(ScenarioStates::new());
        let handles: Vec<_> = (0..16)
            .map(|n| {
                let states = Arc::clone(&states);
                std::thread::spawn(move || {
                    states
                        .create(ScenarioId::new(format!("s{n}")), ScenarioContext::default())
                        .is_ok()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap_or_else(|_| panic!("thread panicked")));
        }
        assert_eq!(states.len(), 16);
    }
}
