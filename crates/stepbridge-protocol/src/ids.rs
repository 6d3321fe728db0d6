//! Identifier newtypes used to correlate protocol messages.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Correlation token assigned by the engine to a command expecting a reply.
///
/// # Examples
///
/// ```
/// use stepbridge_protocol::ActionId;
///
/// let id = ActionId::from("action-7");
/// assert_eq!(id.as_str(), "action-7");
/// assert_eq!(id.to_string(), "action-7");
/// ```
#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

/// Identifier of one executable scenario ("pickle").
#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

/// Identifier the engine echoes back to request a registered step definition.
///
/// The application side assigns these as decimal registration indices, but
/// the engine treats them as opaque strings; [`StepDefinitionId::index`]
/// recovers the index and rejects anything malformed.
///
/// # Examples
///
/// ```
/// use stepbridge_protocol::StepDefinitionId;
///
/// assert_eq!(StepDefinitionId::from_index(3).index(), Some(3));
/// assert_eq!(StepDefinitionId::from("three").index(), None);
/// ```
#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepDefinitionId(String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            /// Wrap an identifier string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Access the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

string_id!(ActionId);
string_id!(ScenarioId);
string_id!(StepDefinitionId);

impl StepDefinitionId {
    /// Build the identifier for the definition registered at `index`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(index.to_string())
    }

    /// Parse the registration index, returning `None` for malformed text.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.0.parse().ok()
    }
}
