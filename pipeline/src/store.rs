use std::path::{Path, PathBuf};

use analysis::datasets::FeatureTable;
use common::tables::{DeathRow, PlayerRoundRow, PlayerRow, RoundRow};
use common::BatchSummary;

use crate::{PipelineError, Result};

/// All tables the parse stage produces for one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutput {
    pub match_id: String,
    pub rounds: Vec<RoundRow>,
    pub deaths: Vec<DeathRow>,
    pub players: Vec<PlayerRow>,
    pub player_rounds: Vec<PlayerRoundRow>,
}

/// What the feature stage needs back from the parse stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMatch {
    pub match_id: String,
    pub rounds: Vec<RoundRow>,
    pub deaths: Vec<DeathRow>,
}

pub trait MatchStore {
    /// Writes every table of the match or, on failure, none of them.
    fn write_match(&self, output: &MatchOutput) -> Result<()>;

    fn write_table(&self, table: &FeatureTable) -> Result<()>;

    fn write_summary(&self, summary: &BatchSummary) -> Result<()>;

    /// Ids of the matches with a stored rounds table, sorted.
    fn stored_matches(&self) -> Result<Vec<String>>;

    fn load_match(&self, match_id: &str) -> Result<StoredMatch>;
}

pub struct FileStore {
    folder: std::sync::Arc<PathBuf>,
}

/// No other per-match table name may end in this suffix, the match ids are read back from it.
const ROUNDS_SUFFIX: &str = "_rounds.csv";

impl FileStore {
    pub fn new<P>(folder: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            folder: std::sync::Arc::new(folder.into()),
        }
    }

    pub fn folder(&self) -> &Path {
        self.folder.as_path()
    }

    fn ensure_folder(&self) -> Result<()> {
        std::fs::create_dir_all(self.folder.as_path()).map_err(|e| PipelineError::io(self.folder.as_path(), e))
    }

    fn match_file(&self, match_id: &str, table: &str) -> PathBuf {
        self.folder.join(format!("{}_{}.csv", match_id, table))
    }

    /// Writes all files next to their targets first and only renames them once every one was written.
    fn commit(&self, files: Vec<(PathBuf, Vec<u8>)>) -> Result<()> {
        self.ensure_folder()?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
        for (target, content) in files {
            let temporary = target.with_extension("csv.tmp");
            if let Err(e) = std::fs::write(&temporary, content) {
                for (written, _) in staged.iter() {
                    let _ = std::fs::remove_file(written);
                }
                let _ = std::fs::remove_file(&temporary);
                return Err(PipelineError::io(temporary, e));
            }
            staged.push((temporary, target));
        }

        for (position, (temporary, target)) in staged.iter().enumerate() {
            if let Err(e) = std::fs::rename(temporary, target) {
                // none of the set may stay behind
                for (_, renamed) in staged[..position].iter() {
                    let _ = std::fs::remove_file(renamed);
                }
                for (pending, _) in staged[position..].iter() {
                    let _ = std::fs::remove_file(pending);
                }
                return Err(PipelineError::io(target, e));
            }
        }

        Ok(())
    }
}

fn serialize_rows<R>(rows: &[R]) -> Result<Vec<u8>>
where
    R: serde::Serialize,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| PipelineError::Csv(e.into_error().into()))
}

pub fn serialize_table(table: &FeatureTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.key_columns.iter().chain(table.value_columns.iter()))?;

    for row in table.rows.iter() {
        let values = row.values.iter().map(|v| v.to_string());
        writer.write_record(row.keys.iter().cloned().chain(values))?;
    }

    writer.into_inner().map_err(|e| PipelineError::Csv(e.into_error().into()))
}

fn read_rows<R>(path: &Path) -> Result<Vec<R>>
where
    R: serde::de::DeserializeOwned,
{
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

impl MatchStore for FileStore {
    #[tracing::instrument(skip_all, fields(match_id = %output.match_id))]
    fn write_match(&self, output: &MatchOutput) -> Result<()> {
        let files = vec![
            (self.match_file(&output.match_id, "rounds"), serialize_rows(&output.rounds)?),
            (self.match_file(&output.match_id, "deaths"), serialize_rows(&output.deaths)?),
            (self.match_file(&output.match_id, "players"), serialize_rows(&output.players)?),
            (
                self.match_file(&output.match_id, "player_round_stats"),
                serialize_rows(&output.player_rounds)?,
            ),
        ];

        self.commit(files)?;
        tracing::debug!(rounds = output.rounds.len(), deaths = output.deaths.len(), "Stored match");
        Ok(())
    }

    fn write_table(&self, table: &FeatureTable) -> Result<()> {
        let path = self.folder.join(format!("{}.csv", table.name));
        self.commit(vec![(path, serialize_table(table)?)])?;

        tracing::info!(table = %table.name, rows = table.len(), columns = table.value_columns.len(), "Wrote feature table");
        Ok(())
    }

    fn write_summary(&self, summary: &BatchSummary) -> Result<()> {
        self.ensure_folder()?;

        let path = self.folder.join(format!("{}_summary.json", summary.stage));
        let content = serde_json::to_vec_pretty(summary)?;
        std::fs::write(&path, content).map_err(|e| PipelineError::io(path, e))
    }

    fn stored_matches(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(self.folder.as_path()).map_err(|e| PipelineError::io(self.folder.as_path(), e))?;

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(self.folder.as_path(), e))?;
            let name = entry.file_name();
            if let Some(match_id) = name.to_str().and_then(|n| n.strip_suffix(ROUNDS_SUFFIX)) {
                matches.push(match_id.to_owned());
            }
        }
        matches.sort();

        Ok(matches)
    }

    fn load_match(&self, match_id: &str) -> Result<StoredMatch> {
        Ok(StoredMatch {
            match_id: match_id.to_owned(),
            rounds: read_rows(&self.match_file(match_id, "rounds"))?,
            deaths: read_rows(&self.match_file(match_id, "deaths"))?,
        })
    }
}
