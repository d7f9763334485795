// File: src/nonterm/store.rs
use crate::core::types::TokenId;
use crate::error::{JoinError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Boundary positions around a placeholder, outside-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextPosition {
    OuterLeft = 0,
    InnerLeft = 1,
    InnerRight = 2,
    OuterRight = 3,
}

impl ContextPosition {
    pub const ALL: [ContextPosition; 4] = [
        ContextPosition::OuterLeft,
        ContextPosition::InnerLeft,
        ContextPosition::InnerRight,
        ContextPosition::OuterRight,
    ];
}

/// Symbol pairs that are counted jointly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairPosition {
    /// (inner-left, inner-right)
    Inner = 0,
    /// (outer-left, outer-right)
    Outer = 1,
}

impl fmt::Display for ContextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextPosition::OuterLeft => "outer-left",
            ContextPosition::InnerLeft => "inner-left",
            ContextPosition::InnerRight => "inner-right",
            ContextPosition::OuterRight => "outer-right",
        };
        f.write_str(name)
    }
}

impl fmt::Display for PairPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairPosition::Inner => f.write_str("inner-pair"),
            PairPosition::Outer => f.write_str("outer-pair"),
        }
    }
}

impl FromStr for ContextPosition {
    type Err = JoinError;

    fn from_str(s: &str) -> Result<Self> {
        ContextPosition::ALL
            .into_iter()
            .find(|position| position.to_string() == s)
            .ok_or_else(|| JoinError::Parse(format!("unknown context position `{}`", s)))
    }
}

impl FromStr for PairPosition {
    type Err = JoinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inner" | "inner-pair" => Ok(PairPosition::Inner),
            "outer" | "outer-pair" => Ok(PairPosition::Outer),
            _ => Err(JoinError::Parse(format!("unknown pair position `{}`", s))),
        }
    }
}

/// Boundary-symbol counts observed around one placeholder.
///
/// Every record bumps one entry in each single-position map and the total
/// once, so `total` equals the sum of any single-position map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbStore {
    single: [HashMap<TokenId, f32>; 4],
    joint: [HashMap<(TokenId, TokenId), f32>; 2],
    total: f32,
}

impl ProbStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation. `symbols` are in [`ContextPosition`] order.
    pub(crate) fn add(&mut self, symbols: [TokenId; 4], count: f32) {
        for (map, &symbol) in self.single.iter_mut().zip(symbols.iter()) {
            *map.entry(symbol).or_insert(0.0) += count;
        }
        let [outer_left, inner_left, inner_right, outer_right] = symbols;
        *self.joint[PairPosition::Inner as usize]
            .entry((inner_left, inner_right))
            .or_insert(0.0) += count;
        *self.joint[PairPosition::Outer as usize]
            .entry((outer_left, outer_right))
            .or_insert(0.0) += count;
        self.total += count;
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn count(&self, position: ContextPosition, symbol: TokenId) -> f32 {
        self.single[position as usize].get(&symbol).copied().unwrap_or(0.0)
    }

    pub fn pair_count(&self, position: PairPosition, left: TokenId, right: TokenId) -> f32 {
        self.joint[position as usize]
            .get(&(left, right))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn distinct(&self, position: ContextPosition) -> usize {
        self.single[position as usize].len()
    }

    pub fn distinct_pairs(&self, position: PairPosition) -> usize {
        self.joint[position as usize].len()
    }

    /// Additively smoothed P(symbol | position).
    pub fn prob(&self, position: ContextPosition, symbol: TokenId, smoothing: f32) -> Result<f32> {
        let numerator = self.count(position, symbol) + smoothing;
        let denominator = self.total + smoothing * self.distinct(position) as f32;
        divide(numerator, denominator, &position, smoothing)
    }

    /// Additively smoothed P(left, right | pair position).
    pub fn pair_prob(
        &self,
        position: PairPosition,
        left: TokenId,
        right: TokenId,
        smoothing: f32,
    ) -> Result<f32> {
        let numerator = self.pair_count(position, left, right) + smoothing;
        let denominator = self.total + smoothing * self.distinct_pairs(position) as f32;
        divide(numerator, denominator, &position, smoothing)
    }
}

fn divide(numerator: f32, denominator: f32, position: &dyn fmt::Display, smoothing: f32) -> Result<f32> {
    if denominator == 0.0 {
        return Err(JoinError::DivisionByZero {
            position: position.to_string(),
            smoothing,
        });
    }
    Ok(numerator / denominator)
}
