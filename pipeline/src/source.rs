use std::path::{Path, PathBuf};

use analysis::event::{EventKind, MatchEvents};
use analysis::source::{self, EventSource, RawTable, SourceError};

/// Reads the CSV export of the decoder, one directory per match:
/// `<root>/<match_id>/{round_end,player_death,bomb_planted,bomb_defused,bomb_exploded}.csv`
/// and an optional `header.json` with the map name.
pub struct CsvTableSource {
    root: std::sync::Arc<PathBuf>,
}

impl CsvTableSource {
    pub fn new<P>(root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            root: std::sync::Arc::new(root.into()),
        }
    }

    fn match_folder(&self, match_id: &str) -> PathBuf {
        self.root.join(match_id)
    }

    fn read_table(&self, folder: &Path, kind: EventKind) -> Result<Option<RawTable>, SourceError> {
        let path = folder.join(format!("{}.csv", kind.table_name()));
        if !path.exists() {
            return Ok(None);
        }

        read_csv(kind.table_name(), &path).map(Some)
    }

    fn map_name(&self, folder: &Path) -> String {
        let path = folder.join("header.json");
        let header = std::fs::read(&path)
            .ok()
            .and_then(|raw| serde_json::from_slice::<common::MatchHeader>(&raw).ok());

        match header {
            Some(h) if !h.map_name.is_empty() => h.map_name,
            _ => {
                tracing::debug!(path = %path.display(), "No usable header, map is unknown");
                "unknown".to_owned()
            }
        }
    }
}

fn read_error<E>(table: &str, error: E) -> SourceError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SourceError::Read {
        table: table.to_owned(),
        source: Box::new(error),
    }
}

pub fn read_csv(name: &str, path: &Path) -> Result<RawTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_error(name, e))?;

    let headers = reader
        .headers()
        .map_err(|e| read_error(name, e))?
        .iter()
        .map(|h| h.to_owned())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| read_error(name, e))?;
        rows.push(record.iter().map(|c| c.to_owned()).collect());
    }

    Ok(RawTable::new(name, headers, rows))
}

impl EventSource for CsvTableSource {
    fn matches(&self) -> Result<Vec<String>, SourceError> {
        let entries = std::fs::read_dir(self.root.as_path()).map_err(|e| read_error("matches", e))?;

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| read_error("matches", e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                matches.push(name.to_owned());
            }
        }
        matches.sort();

        Ok(matches)
    }

    #[tracing::instrument(skip(self))]
    fn load(&self, match_id: &str) -> Result<MatchEvents, SourceError> {
        let folder = self.match_folder(match_id);
        let map_name = self.map_name(&folder);

        source::decode_match(match_id, map_name, |kind| self.read_table(&folder, kind))
    }
}
