// File: src/persistence.rs
use crate::core::types::Vocabulary;
use crate::error::Result;
use crate::nonterm::NonTermContext;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// The symbols of a frozen context are only meaningful together with the
/// vocabulary they were interned against, so both travel in one snapshot.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    vocabulary: &'a Vocabulary,
    context: &'a NonTermContext,
}

#[derive(Deserialize)]
struct Snapshot {
    vocabulary: Vocabulary,
    context: NonTermContext,
}

pub fn save_to_disk(vocabulary: &Vocabulary, context: &NonTermContext, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &SnapshotRef { vocabulary, context })?;
        writer.flush()?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    tracing::info!(
        "Saved {} placeholders and {} symbols to {:?}",
        context.num_placeholders(),
        vocabulary.len(),
        path
    );
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<(Vocabulary, NonTermContext)> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;
    tracing::info!(
        "Loaded {} placeholders and {} symbols from {:?}",
        snapshot.context.num_placeholders(),
        snapshot.vocabulary.len(),
        path
    );
    Ok((snapshot.vocabulary, snapshot.context))
}
