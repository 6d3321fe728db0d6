//! Ordered registry of step definitions.
//!
//! Definitions are identified by their registration index, rendered as a
//! decimal string on the wire. The registry is populated before a run and
//! only read afterwards.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use stepbridge_protocol::{
    PatternKind, StepDefinitionConfig, StepDefinitionId, StepDefinitionPattern,
};

use crate::{
    ScenarioContext, StepError, StepHandler,
    error::{LookupError, RegistryError},
};

/// A registered pattern and the handler bound to it.
#[derive(Clone)]
pub struct StepDefinition {
    pattern: Regex,
    handler: StepHandler,
}

impl StepDefinition {
    /// Pattern source text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Handler invoked when the engine requests this definition.
    #[must_use]
    pub fn handler(&self) -> &StepHandler {
        &self.handler
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// A definition bound to the arguments captured for one step.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    /// Identifier the engine used.
    pub id: StepDefinitionId,
    /// Matched definition.
    pub definition: StepDefinition,
    /// Captured arguments in match order.
    pub args: Vec<String>,
}

/// Step definitions in registration order.
///
/// # Examples
///
/// ```
/// use stepbridge::{StepRegistry, StepDefinitionId};
///
/// let mut registry = StepRegistry::new();
/// let id = registry
///     .register(r#"^you concat "([^"]*)" and "([^"]*)"$"#, |_, _| Ok(()))
///     .unwrap();
/// assert_eq!(id, StepDefinitionId::from_index(0));
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPattern`] when `pattern` is not a valid
    /// regular expression.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<StepDefinitionId, RegistryError>
    where
        F: Fn(&mut ScenarioContext, &[String]) -> Result<(), StepError> + Send + Sync + 'static,
    {
        let compiled = Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        let id = StepDefinitionId::from_index(self.definitions.len());
        self.definitions.push(StepDefinition {
            pattern: compiled,
            handler: Arc::new(handler),
        });
        tracing::debug!(%id, pattern, "registered step definition");
        Ok(id)
    }

    /// Look up the definition for `id` and bind `args` to it.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::MalformedStepDefinitionId`] when `id` is not a
    /// decimal index and [`LookupError::UnknownStepDefinition`] when it is out
    /// of range.
    pub fn resolve(&self, id: &StepDefinitionId, args: Vec<String>) -> Result<ResolvedStep, LookupError> {
        let index = id
            .index()
            .ok_or_else(|| LookupError::MalformedStepDefinitionId(id.clone()))?;
        let definition = self
            .definitions
            .get(index)
            .cloned()
            .ok_or_else(|| LookupError::UnknownStepDefinition {
                id: id.clone(),
                registered: self.definitions.len(),
            })?;
        Ok(ResolvedStep {
            id: id.clone(),
            definition,
            args,
        })
    }

    /// Describe every definition for the start command.
    #[must_use]
    pub fn configs(&self) -> Vec<StepDefinitionConfig> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| StepDefinitionConfig {
                id: StepDefinitionId::from_index(index),
                pattern: StepDefinitionPattern {
                    source: definition.pattern().to_owned(),
                    kind: PatternKind::RegularExpression,
                },
            })
            .collect()
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no definitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
