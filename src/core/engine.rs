use crate::config::JoinScoreConfig;
use crate::core::context::ContextWindow;
use crate::core::juncture::JunctureCode;
use crate::core::state::JoinState;
use crate::core::types::{Interner, TokenId};
use crate::error::Result;

/// Scores the orthography of a closed compound.
pub trait OrthographyScorer: Send + Sync {
    fn score(&self, morphemes: &ContextWindow) -> f32;
}

/// Default hook: every compound is orthographically neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralOrthography;

impl OrthographyScorer for NeutralOrthography {
    fn score(&self, _morphemes: &ContextWindow) -> f32 {
        0.0
    }
}

impl<F> OrthographyScorer for F
where
    F: Fn(&ContextWindow) -> f32 + Send + Sync,
{
    fn score(&self, morphemes: &ContextWindow) -> f32 {
        self(morphemes)
    }
}

/// Counts gathered while scoring one extension.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreCounters {
    pub words: usize,
    pub compounds: usize,
    pub invalid_joins: usize,
    pub compound_word_score: f32,
}

/// The stateful compounding feature.
///
/// Tokens carrying a `+` marker are sub-word units; the scorer tracks the
/// compound they open across extensions and counts real words, compounds,
/// and joins whose markers do not line up.
pub struct JoinScorer<'v> {
    config: JoinScoreConfig,
    vocab: &'v dyn Interner,
    orthography: Box<dyn OrthographyScorer + 'v>,
}

impl<'v> JoinScorer<'v> {
    pub fn new(config: JoinScoreConfig, vocab: &'v dyn Interner) -> Self {
        Self::with_orthography(config, vocab, NeutralOrthography)
    }

    pub fn with_orthography<O>(config: JoinScoreConfig, vocab: &'v dyn Interner, orthography: O) -> Self
    where
        O: OrthographyScorer + 'v,
    {
        tracing::debug!(
            "JoinScorer {}: {} components, capacity {:?}",
            config.name,
            config.num_components(),
            config.capacity()
        );
        Self {
            config,
            vocab,
            orthography: Box::new(orthography),
        }
    }

    pub fn config(&self) -> &JoinScoreConfig {
        &self.config
    }

    /// State of a hypothesis that has produced no output yet.
    pub fn empty_state(&self) -> JoinState {
        JoinState::new(ContextWindow::new(self.config.capacity()), JunctureCode::Plain)
    }

    /// Scores a new output phrase appended to a hypothesis in state `prev`.
    /// `is_final` marks the extension that completes the input, which
    /// force-closes any compound still open.
    ///
    /// The carried window is re-checked against this feature's
    /// `max-morpheme-state`; a restored state holding more morphemes than
    /// that is a `WindowOverflow`.
    pub fn evaluate_extension(
        &self,
        prev: &JoinState,
        phrase: &[TokenId],
        is_final: bool,
    ) -> Result<(JoinState, Vec<f32>)> {
        let carried: Vec<TokenId> = prev.window().tokens().collect();
        let mut morphemes = ContextWindow::from_tokens(self.config.capacity(), &carried)?;
        let mut prev_code = prev.juncture();
        let mut counters = ScoreCounters::default();

        for &token in phrase {
            let curr_code = JunctureCode::classify(self.vocab, token);
            self.transition(&mut counters, &mut morphemes, Some(token), prev_code, curr_code)?;
            prev_code = curr_code;
        }

        // end of sentence
        if is_final {
            self.transition(&mut counters, &mut morphemes, None, prev_code, JunctureCode::Plain)?;
        }

        Ok((JoinState::new(morphemes, prev_code), self.scores(&counters)))
    }

    /// Score vector in component order, skipping disabled components.
    pub fn scores(&self, counters: &ScoreCounters) -> Vec<f32> {
        let components = [
            (self.config.score_real_words, counters.words as f32),
            (self.config.score_num_compounds, counters.compounds as f32),
            (self.config.score_invalid_joins, counters.invalid_joins as f32),
            (self.config.score_compound_word, counters.compound_word_score),
        ];
        components
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|&(_, count)| self.calc_score(count))
            .collect()
    }

    pub fn calc_score(&self, count: f32) -> f32 {
        if self.config.tuneable {
            count * self.config.multiplier
        } else if count > 0.0 {
            f32::NEG_INFINITY
        } else {
            0.0
        }
    }

    /// Like [`JoinScorer::transition`], for codes that come from outside the
    /// classifier. Codes outside 0..=4 abort the call.
    pub fn transition_raw(
        &self,
        counters: &mut ScoreCounters,
        morphemes: &mut ContextWindow,
        token: Option<TokenId>,
        prev: i32,
        curr: i32,
    ) -> Result<()> {
        let (prev, curr) = JunctureCode::checked_pair(prev, curr)?;
        self.transition(counters, morphemes, token, prev, curr)
    }

    /// One step of the join state machine.
    pub fn transition(
        &self,
        counters: &mut ScoreCounters,
        morphemes: &mut ContextWindow,
        token: Option<TokenId>,
        prev: JunctureCode,
        curr: JunctureCode,
    ) -> Result<()> {
        use JunctureCode::*;

        match (prev, curr) {
            // No boundary pending.
            (Plain | Leading, Plain | Oov) => {
                counters.words += 1;
            }
            (Plain | Leading, Leading | Both) => {
                debug_assert!(morphemes.is_empty());
                counters.words += 1;
                counters.compounds += 1;
                counters.invalid_joins += 1;
                push(morphemes, token)?;
                self.close(counters, morphemes);
            }
            (Plain | Leading, Trailing) => {
                debug_assert!(morphemes.is_empty());
                counters.words += 1;
                counters.compounds += 1;
                push(morphemes, token)?;
            }

            // Compound open.
            (Trailing | Both, Plain) => {
                counters.words += 1;
                counters.invalid_joins += 1;
                self.close(counters, morphemes);
            }
            (Trailing | Both, Leading | Both) => {
                push(morphemes, token)?;
                self.close(counters, morphemes);
            }
            (Trailing | Both, Trailing) => {
                counters.words += 1;
                counters.compounds += 1;
                counters.invalid_joins += 1;
                self.close(counters, morphemes);
                push(morphemes, token)?;
            }
            // An OOV token leaves the boundary unresolved.
            (Trailing | Both, Oov) => {}

            // Previous token OOV.
            (Oov, Plain) => {
                counters.words += 1;
                self.close(counters, morphemes);
            }
            (Oov, Leading) => {
                push(morphemes, token)?;
                self.close(counters, morphemes);
            }
            (Oov, Trailing) => {
                counters.words += 1;
                counters.compounds += 1;
                self.close(counters, morphemes);
                push(morphemes, token)?;
            }
            (Oov, Both) => {}
            (Oov, Oov) => {
                counters.words += 1;
                self.close(counters, morphemes);
                push(morphemes, token)?;
            }
        }
        Ok(())
    }

    fn close(&self, counters: &mut ScoreCounters, morphemes: &mut ContextWindow) {
        if !morphemes.is_empty() {
            counters.compound_word_score += self.orthography.score(morphemes);
            tracing::trace!("closed compound of {} morphemes", morphemes.len());
        }
        morphemes.clear();
    }
}

fn push(morphemes: &mut ContextWindow, token: Option<TokenId>) -> Result<()> {
    match token {
        Some(token) => morphemes.push(token),
        None => Ok(()),
    }
}
