//! Changes observed on the element graph between two states.

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// A single addition, removal or modification of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change<T = Element> {
    Addition { after: T },
    Removal { before: T },
    Modification { before: T, after: T },
}

impl<T> Change<T> {
    pub fn addition(after: T) -> Self {
        Change::Addition { after }
    }

    pub fn removal(before: T) -> Self {
        Change::Removal { before }
    }

    pub fn modification(before: T, after: T) -> Self {
        Change::Modification { before, after }
    }

    /// The most recent state: `after` for additions and modifications, `before` for removals.
    pub fn data(&self) -> &T {
        match self {
            Change::Addition { after } | Change::Modification { after, .. } => after,
            Change::Removal { before } => before,
        }
    }

    /// State before the change, if any.
    pub fn before(&self) -> Option<&T> {
        match self {
            Change::Removal { before } | Change::Modification { before, .. } => Some(before),
            Change::Addition { .. } => None,
        }
    }

    /// State after the change, if any.
    pub fn after(&self) -> Option<&T> {
        match self {
            Change::Addition { after } | Change::Modification { after, .. } => Some(after),
            Change::Removal { .. } => None,
        }
    }

    pub fn is_addition(&self) -> bool {
        matches!(self, Change::Addition { .. })
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Change::Removal { .. })
    }
}
