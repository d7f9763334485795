// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A unique identifier for an interned surface form.
pub type TokenId = u32;

/// Metadata associated with a single interned token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub surface: String,
    /// Set when the token was first seen outside the known vocabulary.
    pub oov: bool,
}

/// Symbol identity and OOV lookup, the only view of the interner that
/// scoring components need.
pub trait Interner {
    fn token(&self, id: TokenId) -> Option<&TokenMetadata>;

    fn surface(&self, id: TokenId) -> Option<&str> {
        self.token(id).map(|meta| meta.surface.as_str())
    }

    /// Identities the interner never handed out count as out of vocabulary.
    fn is_oov(&self, id: TokenId) -> bool {
        self.token(id).map_or(true, |meta| meta.oov)
    }
}

/// Process-wide token interner. Built once and passed by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    metadata_store: Vec<TokenMetadata>,
    index: HashMap<String, TokenId>,
}

/// Running-token and type counts of a text measured against a vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OovStats {
    pub tokens: usize,
    pub oov_tokens: usize,
    pub types: usize,
    pub oov_types: usize,
}

impl OovStats {
    pub fn token_rate(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.oov_tokens as f64 / self.tokens as f64
        }
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every whitespace-delimited token of `corpus` becomes known vocabulary.
    pub fn from_corpus(corpus: &str) -> Self {
        let mut vocab = Self::new();
        for word in corpus.split_whitespace() {
            vocab.intern(word);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.metadata_store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata_store.is_empty()
    }

    pub fn lookup(&self, surface: &str) -> Option<TokenId> {
        self.index.get(surface).copied()
    }

    /// Gets or creates a known token. An existing token keeps both its
    /// identity and its OOV flag, so a token never changes class once
    /// handed out.
    pub fn intern(&mut self, surface: &str) -> TokenId {
        match self.lookup(surface) {
            Some(id) => id,
            None => self.push(surface, false),
        }
    }

    /// Gets the existing identity of `surface`, or interns it flagged OOV.
    pub fn intern_or_oov(&mut self, surface: &str) -> TokenId {
        match self.lookup(surface) {
            Some(id) => id,
            None => self.push(surface, true),
        }
    }

    /// Interns every whitespace-delimited token of a line, new ones as OOV.
    pub fn encode(&mut self, line: &str) -> Vec<TokenId> {
        line.split_whitespace()
            .map(|word| self.intern_or_oov(word))
            .collect()
    }

    /// Measures how much of `text` falls outside this vocabulary.
    pub fn oov_stats(&self, text: &str) -> OovStats {
        let mut stats = OovStats::default();
        let mut seen = HashSet::new();
        for word in text.split_whitespace() {
            let known = self.lookup(word).map_or(false, |id| !self.is_oov(id));
            stats.tokens += 1;
            if !known {
                stats.oov_tokens += 1;
            }
            if seen.insert(word) {
                stats.types += 1;
                if !known {
                    stats.oov_types += 1;
                }
            }
        }
        stats
    }

    /// Distinct words of `text` outside this vocabulary, in order of first
    /// occurrence.
    pub fn oov_words<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut seen = HashSet::new();
        text.split_whitespace()
            .filter(|word| self.lookup(word).map_or(true, |id| self.is_oov(id)))
            .filter(|word| seen.insert(*word))
            .collect()
    }

    fn push(&mut self, surface: &str, oov: bool) -> TokenId {
        let id = self.metadata_store.len() as TokenId;
        self.metadata_store.push(TokenMetadata {
            surface: surface.to_string(),
            oov,
        });
        self.index.insert(surface.to_string(), id);
        id
    }
}

impl Interner for Vocabulary {
    fn token(&self, id: TokenId) -> Option<&TokenMetadata> {
        self.metadata_store.get(id as usize)
    }
}
