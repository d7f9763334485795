// File: src/core/juncture.rs
use crate::core::types::{Interner, TokenId};
use crate::error::{JoinError, Result};
use serde::{Deserialize, Serialize};

/// Boundary marker that glues sub-word units together, e.g. `haus+ +tür`.
pub const JOIN_MARKER: char = '+';

/// Boundary classification of a token with respect to morphological joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum JunctureCode {
    #[default]
    Plain = 0,
    Leading = 1,
    Trailing = 2,
    Both = 3,
    Oov = 4,
}

impl JunctureCode {
    /// Classifies a token. Total: unknown identities classify as OOV.
    pub fn classify<I: Interner + ?Sized>(interner: &I, token: TokenId) -> Self {
        match interner.token(token) {
            Some(meta) if !meta.oov => Self::from_surface(&meta.surface),
            _ => JunctureCode::Oov,
        }
    }

    /// Classification of an in-vocabulary surface form.
    pub fn from_surface(surface: &str) -> Self {
        // A lone "+" is an ordinary token, not a marker.
        if surface.chars().count() <= 1 {
            return JunctureCode::Plain;
        }
        match (surface.starts_with(JOIN_MARKER), surface.ends_with(JOIN_MARKER)) {
            (false, false) => JunctureCode::Plain,
            (true, false) => JunctureCode::Leading,
            (false, true) => JunctureCode::Trailing,
            (true, true) => JunctureCode::Both,
        }
    }

    /// Validates a pair of raw codes, as carried by an externally restored
    /// state, before they reach the transition table.
    pub fn checked_pair(prev: i32, curr: i32) -> Result<(Self, Self)> {
        match (Self::from_raw(prev), Self::from_raw(curr)) {
            (Some(p), Some(c)) => Ok((p, c)),
            _ => Err(JoinError::InvalidJuncture { prev, curr }),
        }
    }

    pub fn from_raw(code: i32) -> Option<Self> {
        match code {
            0 => Some(JunctureCode::Plain),
            1 => Some(JunctureCode::Leading),
            2 => Some(JunctureCode::Trailing),
            3 => Some(JunctureCode::Both),
            4 => Some(JunctureCode::Oov),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vocabulary;

    #[test]
    fn test_surface_classification() {
        assert_eq!(JunctureCode::from_surface("haus"), JunctureCode::Plain);
        assert_eq!(JunctureCode::from_surface("+tür"), JunctureCode::Leading);
        assert_eq!(JunctureCode::from_surface("haus+"), JunctureCode::Trailing);
        assert_eq!(JunctureCode::from_surface("+s+"), JunctureCode::Both);
        assert_eq!(JunctureCode::from_surface("++"), JunctureCode::Both);
        assert_eq!(JunctureCode::from_surface("+"), JunctureCode::Plain);
        assert_eq!(JunctureCode::from_surface(""), JunctureCode::Plain);
    }

    #[test]
    fn test_oov_wins_over_markers() {
        let mut vocab = Vocabulary::from_corpus("haus");
        let known = vocab.intern_or_oov("haus");
        let oov_plain = vocab.intern_or_oov("zebra");
        let oov_marked = vocab.intern_or_oov("+s+");
        assert_eq!(JunctureCode::classify(&vocab, known), JunctureCode::Plain);
        assert_eq!(JunctureCode::classify(&vocab, oov_plain), JunctureCode::Oov);
        assert_eq!(JunctureCode::classify(&vocab, oov_marked), JunctureCode::Oov);
    }

    #[test]
    fn test_raw_codes() {
        for raw in 0..=4 {
            assert_eq!(JunctureCode::from_raw(raw).map(JunctureCode::as_raw), Some(raw));
        }
        assert!(JunctureCode::checked_pair(2, 1).is_ok());
        match JunctureCode::checked_pair(2, 5) {
            Err(JoinError::InvalidJuncture { prev, curr }) => assert_eq!((prev, curr), (2, 5)),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(JunctureCode::checked_pair(-1, 0).unwrap_err().is_fatal());
    }
}
