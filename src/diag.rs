//! Warning diagnostics collected during generation.
//!
//! Builders write into an explicit [`Diagnostics`] value instead of a
//! process-wide logger, so callers and tests can inspect exactly what a
//! run produced. The driver forwards everything to `log::warn!`.

use crate::lr::Action;
use std::fmt;

/// A non-fatal problem found while generating. Generation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Two actions competed for the same action-table cell. The
    /// replacement (always a reduce) wins.
    Conflict {
        state: usize,
        lookahead: String,
        existing: Action,
        replacement: Action,
    },
    /// The input configured a key the generator does not know.
    UnknownKey {
        name: String,
        line: usize,
        column: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Conflict {
                state,
                lookahead,
                existing,
                replacement,
            } => write!(
                f,
                "conflict in state {state} on input {lookahead}: {existing} vs {replacement}"
            ),
            Warning::UnknownKey { name, line, column } => {
                write!(f, "{line}:{column}: unknown parameter {name}")
            }
        }
    }
}

/// The sink builders report warnings into.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Forwards every collected warning to the `log` facade.
    pub fn report(&self) {
        for warning in &self.warnings {
            log::warn!("{warning}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display_names_both_actions() {
        let warning = Warning::Conflict {
            state: 4,
            lookahead: "$".to_owned(),
            existing: Action::Reduce(1),
            replacement: Action::Reduce(2),
        };
        assert_eq!(
            warning.to_string(),
            "conflict in state 4 on input $: reduce 1 vs reduce 2"
        );
    }

    #[test]
    fn sink_keeps_insertion_order() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.warn(Warning::UnknownKey {
            name: "COLOR".to_owned(),
            line: 3,
            column: 7,
        });
        diags.warn(Warning::Conflict {
            state: 0,
            lookahead: "x".to_owned(),
            existing: Action::Shift(1),
            replacement: Action::Reduce(0),
        });
        assert_eq!(diags.warnings().len(), 2);
        assert_eq!(
            diags.warnings()[0].to_string(),
            "3:7: unknown parameter COLOR"
        );
    }
}
