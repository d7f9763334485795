use clap::{Parser, Subcommand};
use join_core::core::juncture::JunctureCode;
use join_core::nonterm::{ContextPosition, NonTermContextBuilder, PairPosition};
use join_core::persistence::{load_from_disk, save_to_disk};
use join_core::{Interner, JoinScoreConfig, JoinScorer, Result, Vocabulary};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "join_score", version, about = "Compound join scoring and non-terminal context statistics")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scores stdin lines as consecutive extensions of one hypothesis.
    ///
    /// Each line is one output phrase; the last line completes the input.
    Score {
        /// TOML config file.
        #[clap(short, long)]
        config: Option<PathBuf>,

        /// Feature line, e.g. "JoinScore max-morpheme-state=3". Overrides --config.
        #[clap(short, long)]
        feature: Option<String>,

        /// Corpus whose tokens are in vocabulary; everything else is OOV.
        #[clap(short, long)]
        vocab: Option<PathBuf>,
    },

    /// Ingests non-terminal context records and saves the frozen store.
    BuildContext {
        /// Record file, one property value per line.
        #[clap(short, long)]
        input: PathBuf,

        /// Output snapshot.
        #[clap(short, long)]
        output: PathBuf,
    },

    /// Queries a saved store.
    Query {
        #[clap(short, long)]
        store: PathBuf,

        #[clap(short, long, default_value_t = 0)]
        placeholder: usize,

        /// outer-left, inner-left, inner-right, outer-right, or inner/outer with --right.
        #[clap(long)]
        position: String,

        #[clap(long)]
        symbol: String,

        /// Second symbol of a pair query.
        #[clap(long)]
        right: Option<String>,

        #[clap(long, default_value_t = 1.0)]
        smoothing: f32,
    },

    /// Reports how much of a test text is out of vocabulary.
    Oov {
        #[clap(long)]
        corpus: PathBuf,

        #[clap(long)]
        test: PathBuf,

        /// Also list the distinct OOV words, one per line after the stats.
        #[clap(long)]
        words: bool,
    },
}

#[derive(Serialize)]
struct ScoredLine {
    line: usize,
    scores: Vec<f32>,
    juncture: i32,
    open: Vec<String>,
}

fn main() -> Result<()> {
    join_core::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Score { config, feature, vocab } => score(config, feature, vocab),
        Command::BuildContext { input, output } => build_context(input, output),
        Command::Query {
            store,
            placeholder,
            position,
            symbol,
            right,
            smoothing,
        } => query(store, placeholder, &position, &symbol, right.as_deref(), smoothing),
        Command::Oov { corpus, test, words } => {
            let vocab = Vocabulary::from_corpus(&fs::read_to_string(corpus)?);
            let text = fs::read_to_string(test)?;
            println!("{}", to_json(&vocab.oov_stats(&text))?);
            if words {
                for word in vocab.oov_words(&text) {
                    println!("{}", word);
                }
            }
            Ok(())
        }
    }
}

fn score(config: Option<PathBuf>, feature: Option<String>, vocab: Option<PathBuf>) -> Result<()> {
    let config = match (feature, config) {
        (Some(line), _) => JoinScoreConfig::from_feature_line(&line)?,
        (None, Some(path)) => JoinScoreConfig::load(&path)?,
        (None, None) => JoinScoreConfig::default(),
    };
    let mut vocabulary = match vocab {
        Some(path) => Vocabulary::from_corpus(&fs::read_to_string(path)?),
        None => Vocabulary::new(),
    };

    // Without a corpus every token is known; only markers matter.
    let known_by_default = vocabulary.is_empty();
    let mut phrases = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let phrase = if known_by_default {
            line.split_whitespace().map(|w| vocabulary.intern(w)).collect()
        } else {
            vocabulary.encode(&line)
        };
        phrases.push(phrase);
    }
    if phrases.is_empty() {
        tracing::warn!("No input phrases on stdin");
        return Ok(());
    }

    let scorer = JoinScorer::new(config, &vocabulary);
    let mut state = scorer.empty_state();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let last = phrases.len() - 1;
    for (i, phrase) in phrases.iter().enumerate() {
        let (next, scores) = scorer.evaluate_extension(&state, phrase, i == last)?;
        let scored = ScoredLine {
            line: i + 1,
            scores,
            juncture: next.juncture().as_raw(),
            open: next
                .window()
                .tokens()
                .filter_map(|t| vocabulary.surface(t).map(str::to_string))
                .collect(),
        };
        writeln!(out, "{}", to_json(&scored)?)?;
        state = next;
    }
    if state.juncture() == JunctureCode::Oov && !state.window().is_empty() {
        tracing::warn!("Input ended on an OOV token with a compound still open");
    }
    Ok(())
}

fn build_context(input: PathBuf, output: PathBuf) -> Result<()> {
    let mut vocab = Vocabulary::new();
    let mut builder = NonTermContextBuilder::new();
    let reader = BufReader::new(File::open(&input)?);
    let blocks = builder.ingest_reader(&mut vocab, reader)?;
    tracing::info!("Read {} blocks from {:?}", blocks, input);
    let context = builder.finish();
    save_to_disk(&vocab, &context, &output)?;
    println!(
        "Saved {} placeholders ({} symbols) to '{}'",
        context.num_placeholders(),
        vocab.len(),
        output.display()
    );
    Ok(())
}

fn query(
    store: PathBuf,
    placeholder: usize,
    position: &str,
    symbol: &str,
    right: Option<&str>,
    smoothing: f32,
) -> Result<()> {
    let (vocab, context) = load_from_disk(&store)?;
    // Unseen symbols still get smoothed mass; any id outside the
    // vocabulary has count zero.
    let id = |surface: &str| vocab.lookup(surface).unwrap_or(vocab.len() as u32);
    let prob = match right {
        Some(right) => {
            let position: PairPosition = position.parse()?;
            context.pair_prob(placeholder, position, id(symbol), id(right), smoothing)?
        }
        None => {
            let position: ContextPosition = position.parse()?;
            context.prob(placeholder, position, id(symbol), smoothing)?
        }
    };
    println!("{}", prob);
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
