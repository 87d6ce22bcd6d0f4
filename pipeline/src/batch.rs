use analysis::aggregate;
use analysis::weapons::WeaponTaxonomy;
use analysis::EventSource;
use common::{BatchSummary, SkippedMatch};

use crate::rows;
use crate::store::{MatchOutput, MatchStore};
use crate::Result;

/// Outcome of one stage over all matches. A skipped match never stops the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub processed: Vec<String>,
    pub skipped: Vec<(String, String)>,
    pub fallback_events: usize,
}

impl BatchReport {
    pub fn skip<E>(&mut self, match_id: &str, error: E)
    where
        E: std::fmt::Display,
    {
        tracing::warn!(match_id, "Skipping match: {}", error);
        self.skipped.push((match_id.to_owned(), error.to_string()));
    }

    pub fn summary(&self, stage: &str) -> BatchSummary {
        BatchSummary {
            stage: stage.to_owned(),
            processed: self.processed.clone(),
            skipped: self
                .skipped
                .iter()
                .map(|(match_id, reason)| SkippedMatch {
                    match_id: match_id.clone(),
                    reason: reason.clone(),
                })
                .collect(),
            fallback_events: self.fallback_events,
        }
    }
}

/// Segments and aggregates a single match into its output tables.
#[tracing::instrument(skip(source, taxonomy))]
pub fn parse_match(source: &dyn EventSource, match_id: &str, taxonomy: &WeaponTaxonomy) -> Result<(MatchOutput, usize)> {
    let events = source.load(match_id)?;
    let segmented = analysis::segment(events)?;

    let players = aggregate::player_match_stats(&segmented, taxonomy);
    let player_rounds = aggregate::player_round_stats(&segmented, taxonomy);

    let output = MatchOutput {
        match_id: segmented.match_id.clone(),
        rounds: segmented
            .rounds
            .iter()
            .map(|record| rows::round_row(&segmented, record))
            .collect(),
        deaths: rows::death_rows(&segmented),
        players: players.iter().map(|p| rows::player_row(&segmented, p)).collect(),
        player_rounds: player_rounds
            .iter()
            .map(|p| rows::player_round_row(&segmented, p))
            .collect(),
    };

    Ok((output, segmented.fallback_events))
}

/// The parse stage: every match of the source into the store.
///
/// Only failing to list the matches fails the whole batch.
pub fn parse_all(source: &dyn EventSource, store: &dyn MatchStore, taxonomy: &WeaponTaxonomy) -> Result<BatchReport> {
    let matches = source.matches()?;
    tracing::info!(matches = matches.len(), "Parsing matches");

    let mut report = BatchReport::default();
    for match_id in matches {
        let (output, fallback_events) = match parse_match(source, &match_id, taxonomy) {
            Ok(o) => o,
            Err(e) => {
                report.skip(&match_id, e);
                continue;
            }
        };

        if let Err(e) = store.write_match(&output) {
            report.skip(&match_id, e);
            continue;
        }

        if fallback_events > 0 {
            tracing::info!(match_id = %match_id, fallback_events, "Assigned events outside of every round to the nearest round");
        }
        report.fallback_events += fallback_events;
        report.processed.push(match_id);
    }

    tracing::info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        "Parsed matches"
    );

    Ok(report)
}
