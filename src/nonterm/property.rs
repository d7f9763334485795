// File: src/nonterm/property.rs
use crate::core::types::{TokenId, Vocabulary};
use crate::error::{JoinError, Result};
use crate::nonterm::store::{ContextPosition, PairPosition, ProbStore};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Accumulates boundary statistics of a rule's placeholders.
///
/// Ingestion only: the builder is consumed by [`NonTermContextBuilder::finish`],
/// after which the statistics can be queried but no longer changed.
#[derive(Debug, Default)]
pub struct NonTermContextBuilder {
    stores: Vec<ProbStore>,
    records: usize,
}

/// Read-only boundary statistics, shared freely between decoding threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonTermContext {
    stores: Vec<ProbStore>,
}

impl NonTermContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_placeholders(&self) -> usize {
        self.stores.len()
    }

    /// Adds one observation around `placeholder`. A placeholder beyond the
    /// current table grows it.
    pub fn add_record(&mut self, placeholder: usize, symbols: [TokenId; 4], count: f32) {
        if placeholder >= self.stores.len() {
            self.stores.resize_with(placeholder + 1, ProbStore::default);
        }
        self.stores[placeholder].add(symbols, count);
        self.records += 1;
    }

    /// Ingests one property value:
    /// `<numPlaceholders> {<index> <outerLeft> <innerLeft> <innerRight> <outerRight>}+ <count>`,
    /// with the brace group once per placeholder and the whole block
    /// repeated. Symbols are interned on read. Returns the number of blocks.
    ///
    /// The whole value is validated before any statistics change; only a
    /// well-formed value grows the table to its placeholder count.
    pub fn ingest(&mut self, vocab: &mut Vocabulary, value: &str) -> Result<usize> {
        let toks: Vec<&str> = value.split_whitespace().collect();
        let Some(first) = toks.first() else {
            return Ok(0);
        };
        let num_placeholders: usize = parse_field(first, "placeholder count")?;
        if num_placeholders == 0 {
            return Err(JoinError::Parse("rule without placeholders".to_string()));
        }

        let body = &toks[1..];
        let block_len = num_placeholders
            .checked_mul(5)
            .and_then(|n| n.checked_add(1))
            .filter(|&n| n <= body.len())
            .ok_or_else(|| {
                JoinError::Parse(format!(
                    "{} placeholders do not fit in {} tokens after the header",
                    num_placeholders,
                    body.len()
                ))
            })?;
        if body.len() % block_len != 0 {
            return Err(JoinError::Parse(format!(
                "{} tokens after the header do not form blocks of {}",
                body.len(),
                block_len
            )));
        }

        let mut parsed = Vec::with_capacity(body.len() / block_len);
        for block in body.chunks(block_len) {
            let mut contexts = Vec::with_capacity(num_placeholders);
            for (expected, fields) in block[..block_len - 1].chunks(5).enumerate() {
                let found: usize = parse_field(fields[0], "placeholder index")?;
                if found != expected {
                    return Err(JoinError::PlaceholderMismatch { expected, found });
                }
                let mut symbols = [0; 4];
                for (slot, surface) in symbols.iter_mut().zip(&fields[1..]) {
                    *slot = vocab.intern(surface);
                }
                contexts.push(symbols);
            }
            let count: f32 = parse_field(block[block_len - 1], "count")?;
            parsed.push((contexts, count));
        }

        if num_placeholders > self.stores.len() {
            self.stores.resize_with(num_placeholders, ProbStore::default);
        }
        for (contexts, count) in &parsed {
            for (placeholder, &symbols) in contexts.iter().enumerate() {
                self.add_record(placeholder, symbols, *count);
            }
        }
        Ok(parsed.len())
    }

    /// Ingests a bulk file, one property value per non-empty line.
    pub fn ingest_reader<R: BufRead>(&mut self, vocab: &mut Vocabulary, reader: R) -> Result<usize> {
        let mut blocks = 0;
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            blocks += self.ingest(vocab, &line).map_err(|e| match e {
                JoinError::Parse(reason) => JoinError::Parse(format!("line {}: {}", line_no + 1, reason)),
                other => other,
            })?;
        }
        tracing::debug!(
            "Ingested {} blocks ({} records) over {} placeholders",
            blocks,
            self.records,
            self.stores.len()
        );
        Ok(blocks)
    }

    pub fn finish(self) -> NonTermContext {
        NonTermContext { stores: self.stores }
    }
}

impl NonTermContext {
    pub fn num_placeholders(&self) -> usize {
        self.stores.len()
    }

    /// The statistics of one placeholder. Reading beyond the table is an
    /// error, unlike ingestion which grows it.
    pub fn store(&self, placeholder: usize) -> Result<&ProbStore> {
        self.stores.get(placeholder).ok_or(JoinError::IndexOutOfRange {
            index: placeholder,
            len: self.stores.len(),
        })
    }

    pub fn prob(
        &self,
        placeholder: usize,
        position: ContextPosition,
        symbol: TokenId,
        smoothing: f32,
    ) -> Result<f32> {
        self.store(placeholder)?.prob(position, symbol, smoothing)
    }

    pub fn pair_prob(
        &self,
        placeholder: usize,
        position: PairPosition,
        left: TokenId,
        right: TokenId,
        smoothing: f32,
    ) -> Result<f32> {
        self.store(placeholder)?.pair_prob(position, left, right, smoothing)
    }
}

fn parse_field<T: std::str::FromStr>(tok: &str, what: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    tok.parse()
        .map_err(|e| JoinError::Parse(format!("invalid {} `{}`: {}", what, tok, e)))
}
