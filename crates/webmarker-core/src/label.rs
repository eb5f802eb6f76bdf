//! Label assignment for selected elements.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::ElementInfo;
use crate::error::{MarkError, Result};

/// Callback deriving a label from an element and its zero-based index.
pub type LabelFn = Arc<dyn Fn(&ElementInfo, usize) -> String + Send + Sync>;

/// Strategy used to derive labels.
#[derive(Clone, Default)]
pub enum LabelGenerator {
    /// `"0"`, `"1"`, ... in selection order.
    #[default]
    Index,
    /// Spreadsheet-style letters: `"A"`, ..., `"Z"`, `"AA"`, `"AB"`, ...
    Alphabetic,
    Custom(LabelFn),
}

impl LabelGenerator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&ElementInfo, usize) -> String + Send + Sync + 'static,
    {
        LabelGenerator::Custom(Arc::new(f))
    }

    pub fn label(&self, element: &ElementInfo, index: usize) -> String {
        match self {
            LabelGenerator::Index => index.to_string(),
            LabelGenerator::Alphabetic => alphabetic_label(index),
            LabelGenerator::Custom(f) => f(element, index),
        }
    }
}

impl fmt::Debug for LabelGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelGenerator::Index => f.write_str("Index"),
            LabelGenerator::Alphabetic => f.write_str("Alphabetic"),
            LabelGenerator::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// What to do when a generator yields the same label twice in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateLabelPolicy {
    /// Fail the whole pass with [`MarkError::DuplicateLabel`] before any overlay exists.
    #[default]
    Reject,
    /// The later element keeps the label; the earlier one is left unmarked.
    LastWriteWins,
}

/// An element paired with its label and its index in the selection.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub label: String,
    pub index: usize,
    pub element: ElementInfo,
}

/// Assign a label to each element, enforcing uniqueness under `policy`.
///
/// The result keeps selection order. Under `LastWriteWins` a superseded
/// element is dropped and the winner keeps the loser's position.
pub fn assign_labels(
    elements: Vec<ElementInfo>,
    generator: &LabelGenerator,
    policy: DuplicateLabelPolicy,
) -> Result<Vec<Assignment>> {
    let mut assignments: Vec<Option<Assignment>> = Vec::with_capacity(elements.len());
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(elements.len());

    for (index, element) in elements.into_iter().enumerate() {
        let label = generator.label(&element, index);
        match seen.get(&label).copied() {
            Some(slot) => match policy {
                DuplicateLabelPolicy::Reject => return Err(MarkError::DuplicateLabel(label)),
                DuplicateLabelPolicy::LastWriteWins => {
                    debug!(label = %label, index, "label reassigned to later element");
                    assignments[slot] = Some(Assignment {
                        label,
                        index,
                        element,
                    });
                }
            },
            None => {
                seen.insert(label.clone(), assignments.len());
                assignments.push(Some(Assignment {
                    label,
                    index,
                    element,
                }));
            }
        }
    }

    Ok(assignments.into_iter().flatten().collect())
}

/// Zero-based bijective base-26 label.
pub fn alphabetic_label(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
