// File: src/core/state.rs
use crate::core::context::ContextWindow;
use crate::core::juncture::JunctureCode;
use crate::core::types::TokenId;
use crate::error::{JoinError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What a hypothesis carries forward for the join feature: the open
/// compound and the juncture of its last token.
///
/// Two equal states score every future extension identically, so the
/// search may recombine their hypotheses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinState {
    // Field order is the comparison order: window (length, then tokens),
    // then trailing juncture.
    window: ContextWindow,
    juncture: JunctureCode,
}

impl JoinState {
    pub fn new(window: ContextWindow, juncture: JunctureCode) -> Self {
        Self { window, juncture }
    }

    /// Restores a state from raw parts, e.g. when reading back a lattice.
    pub fn from_raw(window: ContextWindow, juncture: i32) -> Result<Self> {
        let juncture = JunctureCode::from_raw(juncture).ok_or(JoinError::InvalidJuncture {
            prev: juncture,
            curr: juncture,
        })?;
        Ok(Self { window, juncture })
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    pub fn juncture(&self) -> JunctureCode {
        self.juncture
    }

    pub fn morphemes(&self) -> Vec<TokenId> {
        self.window.tokens().collect()
    }
}

/// Three-way comparison used by the search for recombination.
pub fn compare_states(a: &JoinState, b: &JoinState) -> i32 {
    match a.cmp(b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::MorphemeCapacity;

    fn state(tokens: &[TokenId], code: JunctureCode) -> JoinState {
        let window = ContextWindow::from_tokens(MorphemeCapacity::Unbounded, tokens).unwrap();
        JoinState::new(window, code)
    }

    #[test]
    fn test_equality_by_content_and_code() {
        assert_eq!(compare_states(&state(&[1, 2], JunctureCode::Trailing), &state(&[1, 2], JunctureCode::Trailing)), 0);
        assert_ne!(compare_states(&state(&[1, 2], JunctureCode::Trailing), &state(&[1, 2], JunctureCode::Oov)), 0);
        assert_ne!(compare_states(&state(&[2, 1], JunctureCode::Trailing), &state(&[1, 2], JunctureCode::Trailing)), 0);
    }

    #[test]
    fn test_order_is_total_and_consistent() {
        let states = vec![
            state(&[], JunctureCode::Plain),
            state(&[], JunctureCode::Oov),
            state(&[5], JunctureCode::Trailing),
            state(&[1, 9], JunctureCode::Plain),
            state(&[1, 9], JunctureCode::Both),
            state(&[2, 0], JunctureCode::Plain),
            state(&[0, 0, 0], JunctureCode::Leading),
        ];
        for a in &states {
            assert_eq!(compare_states(a, a), 0);
            for b in &states {
                assert_eq!(compare_states(a, b), -compare_states(b, a));
                for c in &states {
                    if compare_states(a, b) <= 0 && compare_states(b, c) <= 0 {
                        assert!(compare_states(a, c) <= 0);
                    }
                }
            }
        }
        // Length dominates token identity.
        assert_eq!(compare_states(&states[2], &states[3]), -1);
        // Trailing code breaks ties last.
        assert_eq!(compare_states(&states[3], &states[4]), -1);
    }

    #[test]
    fn test_from_raw_rejects_unknown_code() {
        let window = ContextWindow::new(MorphemeCapacity::Unbounded);
        assert!(JoinState::from_raw(window.clone(), 3).is_ok());
        assert!(matches!(
            JoinState::from_raw(window, 9),
            Err(JoinError::InvalidJuncture { prev: 9, curr: 9 })
        ));
    }
}
