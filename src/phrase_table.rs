//! Phrase-table corpus lines and an in-memory candidate source.
//!
//! Line format: `head words ||| source ||| target ||| alignment ||| scores`.

use crate::error::{JoinError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;

const FIELD_SEPARATOR: &str = "|||";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseTableEntry {
    pub head_words: Vec<String>,
    pub source: Vec<String>,
    pub target: Vec<String>,
    /// (source position, target position) pairs.
    pub alignment: Vec<(usize, usize)>,
    pub scores: Vec<f32>,
}

impl PhraseTableEntry {
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
        if fields.len() != 5 {
            return Err(JoinError::Parse(format!(
                "expected 5 fields separated by `{}`, found {}",
                FIELD_SEPARATOR,
                fields.len()
            )));
        }
        let words = |field: &str| field.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        let source = words(fields[1]);
        let target = words(fields[2]);
        let alignment = parse_alignment(fields[3], source.len(), target.len())?;
        let scores = fields[4]
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f32>()
                    .map_err(|e| JoinError::Parse(format!("invalid score `{}`: {}", tok, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            head_words: words(fields[0]),
            source,
            target,
            alignment,
            scores,
        })
    }
}

fn parse_alignment(field: &str, source_len: usize, target_len: usize) -> Result<Vec<(usize, usize)>> {
    field
        .split_whitespace()
        .map(|point| -> Result<(usize, usize)> {
            let (s, t) = point
                .split_once('-')
                .ok_or_else(|| JoinError::Parse(format!("invalid alignment point `{}`", point)))?;
            let parse = |v: &str| {
                v.parse::<usize>()
                    .map_err(|e| JoinError::Parse(format!("invalid alignment point `{}`: {}", point, e)))
            };
            let (s, t) = (parse(s)?, parse(t)?);
            if s >= source_len || t >= target_len {
                return Err(JoinError::Parse(format!(
                    "alignment point `{}` outside {}x{} phrase pair",
                    point, source_len, target_len
                )));
            }
            Ok((s, t))
        })
        .collect()
}

/// Supplies candidate translations of a source phrase to the decoder.
pub trait CandidateSource {
    fn candidates(&self, source: &[&str]) -> &[PhraseTableEntry];
}

#[derive(Debug, Clone, Default)]
pub struct PhraseTable {
    by_source: HashMap<Vec<String>, Vec<PhraseTableEntry>>,
    num_scores: Option<usize>,
}

impl PhraseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from corpus lines. Every entry must carry the same
    /// number of scores.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            PhraseTableEntry::parse(&line)
                .and_then(|entry| table.insert(entry))
                .map_err(|e| match e {
                    JoinError::Parse(reason) => JoinError::Parse(format!("line {}: {}", line_no + 1, reason)),
                    other => other,
                })?;
        }
        tracing::info!("Loaded phrase table with {} source phrases", table.len());
        Ok(table)
    }

    pub fn insert(&mut self, entry: PhraseTableEntry) -> Result<()> {
        match self.num_scores {
            None => self.num_scores = Some(entry.scores.len()),
            Some(n) if n != entry.scores.len() => {
                return Err(JoinError::Parse(format!(
                    "entry has {} scores, table has {}",
                    entry.scores.len(),
                    n
                )))
            }
            Some(_) => {}
        }
        self.by_source.entry(entry.source.clone()).or_default().push(entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub fn num_scores(&self) -> Option<usize> {
        self.num_scores
    }
}

impl CandidateSource for PhraseTable {
    fn candidates(&self, source: &[&str]) -> &[PhraseTableEntry] {
        let key: Vec<String> = source.iter().map(|w| w.to_string()).collect();
        self.by_source.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}
