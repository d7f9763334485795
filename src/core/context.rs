// File: src/core/context.rs
use crate::core::types::TokenId;
use crate::error::{JoinError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many morphemes an open compound may carry forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MorphemeCapacity {
    Unbounded,
    /// Nothing is ever carried; windows stay empty.
    Stateless,
    Bounded(usize),
}

impl MorphemeCapacity {
    /// Maps the signed `max-morpheme-state` option: <0 unbounded, 0 stateless.
    pub fn from_signed(max: i64) -> Self {
        match max {
            m if m < 0 => MorphemeCapacity::Unbounded,
            0 => MorphemeCapacity::Stateless,
            m => MorphemeCapacity::Bounded(m as usize),
        }
    }
}

/// Morphemes of the compound currently left open by a hypothesis.
///
/// A window is a value: extending a hypothesis clones its predecessor's
/// window, so siblings never observe each other's appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    capacity: MorphemeCapacity,
    morphemes: VecDeque<TokenId>,
}

impl ContextWindow {
    pub fn new(capacity: MorphemeCapacity) -> Self {
        let morphemes = match capacity {
            MorphemeCapacity::Bounded(n) => VecDeque::with_capacity(n),
            _ => VecDeque::new(),
        };
        Self { capacity, morphemes }
    }

    /// Rebuilds a window from carried tokens, rejecting more than fit.
    pub fn from_tokens(capacity: MorphemeCapacity, tokens: &[TokenId]) -> Result<Self> {
        let window = Self {
            capacity,
            morphemes: tokens.iter().copied().collect(),
        };
        window.check_capacity()?;
        Ok(window)
    }

    pub fn capacity(&self) -> MorphemeCapacity {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.morphemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.morphemes.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.morphemes.iter().copied()
    }

    /// Appends a morpheme, evicting the oldest one when the window is full.
    /// O(1) amortized complexity.
    pub fn push(&mut self, token: TokenId) -> Result<()> {
        match self.capacity {
            MorphemeCapacity::Unbounded => {}
            MorphemeCapacity::Stateless | MorphemeCapacity::Bounded(0) => return Ok(()),
            MorphemeCapacity::Bounded(max) => {
                self.check_capacity()?;
                if self.morphemes.len() == max {
                    self.morphemes.pop_front();
                }
            }
        }
        self.morphemes.push_back(token);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.morphemes.clear();
    }

    fn check_capacity(&self) -> Result<()> {
        let max = match self.capacity {
            MorphemeCapacity::Unbounded => return Ok(()),
            MorphemeCapacity::Stateless => 0,
            MorphemeCapacity::Bounded(max) => max,
        };
        if self.morphemes.len() > max {
            return Err(JoinError::WindowOverflow {
                len: self.morphemes.len(),
                max,
            });
        }
        Ok(())
    }
}

// Windows compare by content only; the capacity is a property of the
// feature that produced them.
impl PartialEq for ContextWindow {
    fn eq(&self, other: &Self) -> bool {
        self.morphemes == other.morphemes
    }
}

impl Eq for ContextWindow {}

impl PartialOrd for ContextWindow {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContextWindow {
    /// Shorter windows first, then token identity lexicographically.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.morphemes
            .len()
            .cmp(&other.morphemes.len())
            .then_with(|| self.morphemes.iter().cmp(other.morphemes.iter()))
    }
}

impl std::hash::Hash for ContextWindow {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.morphemes.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_mapping() {
        assert_eq!(MorphemeCapacity::from_signed(-1), MorphemeCapacity::Unbounded);
        assert_eq!(MorphemeCapacity::from_signed(0), MorphemeCapacity::Stateless);
        assert_eq!(MorphemeCapacity::from_signed(3), MorphemeCapacity::Bounded(3));
    }

    #[test]
    fn test_bounded_keeps_most_recent() {
        for max in 1..=4usize {
            let mut window = ContextWindow::new(MorphemeCapacity::Bounded(max));
            for token in 0..10u32 {
                window.push(token).unwrap();
                assert!(window.len() <= max);
            }
            let expected: Vec<TokenId> = (10 - max as u32..10).collect();
            assert_eq!(window.tokens().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn test_stateless_never_appends() {
        let mut window = ContextWindow::new(MorphemeCapacity::Stateless);
        for token in 0..5 {
            window.push(token).unwrap();
        }
        assert!(window.is_empty());
    }

    #[test]
    fn test_unbounded_grows() {
        let mut window = ContextWindow::new(MorphemeCapacity::Unbounded);
        for token in 0..100 {
            window.push(token).unwrap();
        }
        assert_eq!(window.len(), 100);
        window.clear();
        assert!(window.is_empty());
    }

    #[test]
    fn test_overflow_outside_eviction_is_rejected() {
        let err = ContextWindow::from_tokens(MorphemeCapacity::Bounded(2), &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, JoinError::WindowOverflow { len: 3, max: 2 }));
        assert!(err.is_fatal());
        assert!(ContextWindow::from_tokens(MorphemeCapacity::Stateless, &[1]).is_err());
        assert!(ContextWindow::from_tokens(MorphemeCapacity::Bounded(2), &[1, 2]).is_ok());
    }

    #[test]
    fn test_copy_on_branch() {
        let mut parent = ContextWindow::new(MorphemeCapacity::Unbounded);
        parent.push(7).unwrap();
        let mut left = parent.clone();
        let mut right = parent.clone();
        left.push(8).unwrap();
        right.clear();
        assert_eq!(parent.tokens().collect::<Vec<_>>(), vec![7]);
        assert_eq!(left.len(), 2);
        assert!(right.is_empty());
    }

    #[test]
    fn test_order_length_first() {
        let short = ContextWindow::from_tokens(MorphemeCapacity::Unbounded, &[9]).unwrap();
        let long = ContextWindow::from_tokens(MorphemeCapacity::Unbounded, &[1, 2]).unwrap();
        assert!(short < long);
        let a = ContextWindow::from_tokens(MorphemeCapacity::Unbounded, &[1, 3]).unwrap();
        assert!(long < a);
        let other_cap = ContextWindow::from_tokens(MorphemeCapacity::Bounded(5), &[1, 3]).unwrap();
        assert_eq!(a, other_cap);
    }
}
