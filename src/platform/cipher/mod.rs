//! Signature cipher engine
//!
//! The player asset carries a small decipher routine: a function that splits
//! the scrambled signature into an array, hands it to a helper object a few
//! times, and joins it back. This module recovers that routine as an
//! [`OperationPlan`] and replays it natively.

pub mod apply;
pub mod classify;
pub mod extract;

pub use apply::{apply, apply_plan, build_url, AppliedCipher, CipherAnomaly, CipherQuery};
pub use classify::{classify, Classification};
pub use extract::{extract, Extraction};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive array transform used by the player's decipher routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Drop a leading run of elements
    Splice,
    /// Exchange the first element with the one at `arg % len`
    Swap,
    /// Reverse the whole array
    Reverse,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Splice => write!(f, "splice"),
            OperationKind::Swap => write!(f, "swap"),
            OperationKind::Reverse => write!(f, "reverse"),
        }
    }
}

/// One step of an operation plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    /// Ignored for [`OperationKind::Reverse`]
    pub argument: usize,
}

impl Operation {
    pub fn new(kind: OperationKind, argument: usize) -> Self {
        Self { kind, argument }
    }

    pub fn splice(count: usize) -> Self {
        Self::new(OperationKind::Splice, count)
    }

    pub fn swap(index: usize) -> Self {
        Self::new(OperationKind::Swap, index)
    }

    pub fn reverse() -> Self {
        Self::new(OperationKind::Reverse, 0)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::Reverse => write!(f, "reverse"),
            kind => write!(f, "{}({})", kind, self.argument),
        }
    }
}

/// Ordered list of operations recovered from one player release.
///
/// Order is the statement order of the decipher routine and is never
/// rearranged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationPlan {
    operations: Vec<Operation>,
}

impl OperationPlan {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl FromIterator<Operation> for OperationPlan {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a OperationPlan {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl fmt::Display for OperationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.operations.iter().map(|op| op.to_string()).collect();
        write!(f, "[{}]", steps.join(", "))
    }
}
