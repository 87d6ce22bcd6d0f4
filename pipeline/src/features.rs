use analysis::aggregate;
use analysis::datasets::{self, FeatureTable, MatchAnalysis};
use analysis::features::{FeatureConfig, MatchFeatureRow};
use analysis::weapons::WeaponTaxonomy;

use crate::batch::BatchReport;
use crate::rows;
use crate::store::{MatchStore, StoredMatch};
use crate::Result;

/// The per-match analyses of every stored match and all their rounds in match order.
pub struct Corpus {
    pub matches: Vec<MatchAnalysis>,
    pub rounds: Vec<MatchFeatureRow>,
}

/// One family of model-ready tables built from the whole corpus.
pub trait Dataset {
    fn name(&self) -> &'static str;

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable>;
}

pub struct RoundDataset {}
pub struct MatchDataset {}
pub struct PlayerDataset {}
pub struct ClassificationDataset {}
pub struct RegressionDataset {}
pub struct ClusteringDataset {}
pub struct PlayerClusteringDataset {}
pub struct PatternDataset {}

impl Dataset for RoundDataset {
    fn name(&self) -> &'static str {
        "round"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        vec![datasets::round_features(&corpus.rounds)]
    }
}

impl Dataset for MatchDataset {
    fn name(&self) -> &'static str {
        "match"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        vec![datasets::match_features(&corpus.matches)]
    }
}

impl Dataset for PlayerDataset {
    fn name(&self) -> &'static str {
        "player"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        vec![datasets::player_features(&corpus.matches)]
    }
}

impl Dataset for ClassificationDataset {
    fn name(&self) -> &'static str {
        "classification"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        let (raw, scaled) = datasets::classification(&corpus.rounds);
        vec![raw, scaled]
    }
}

impl Dataset for RegressionDataset {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        vec![datasets::regression(&corpus.rounds)]
    }
}

impl Dataset for ClusteringDataset {
    fn name(&self) -> &'static str {
        "clustering"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        let (normalized, standardized) = datasets::clustering(&corpus.rounds);
        vec![normalized, standardized]
    }
}

impl Dataset for PlayerClusteringDataset {
    fn name(&self) -> &'static str {
        "player_clustering"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        let (players, normalized) = datasets::player_clustering(&corpus.matches);
        vec![players, normalized]
    }
}

impl Dataset for PatternDataset {
    fn name(&self) -> &'static str {
        "frequent_patterns"
    }

    fn build(&self, corpus: &Corpus) -> Vec<FeatureTable> {
        let (items, transactions) = datasets::frequent_patterns(&corpus.rounds);
        vec![items, transactions]
    }
}

pub static DATASETS: std::sync::LazyLock<[std::sync::Arc<dyn Dataset + Send + Sync>; 8]> =
    std::sync::LazyLock::new(|| {
        [
            std::sync::Arc::new(RoundDataset {}),
            std::sync::Arc::new(MatchDataset {}),
            std::sync::Arc::new(PlayerDataset {}),
            std::sync::Arc::new(ClassificationDataset {}),
            std::sync::Arc::new(RegressionDataset {}),
            std::sync::Arc::new(ClusteringDataset {}),
            std::sync::Arc::new(PlayerClusteringDataset {}),
            std::sync::Arc::new(PatternDataset {}),
        ]
    });

/// Recomputes the per-round stats and match-relative features of one stored match.
#[tracing::instrument(skip_all, fields(match_id = %stored.match_id))]
pub fn analyse_match(stored: StoredMatch, config: &FeatureConfig, taxonomy: &WeaponTaxonomy) -> Result<MatchAnalysis> {
    let segmented = rows::segmented_match(&stored.match_id, stored.rounds, stored.deaths)?;

    let stats = aggregate::round_stats(&segmented, taxonomy);
    let rounds = analysis::features::match_features(&segmented, stats, config);
    let players = aggregate::player_match_stats(&segmented, taxonomy);

    Ok(MatchAnalysis {
        match_id: segmented.match_id,
        map_name: segmented.map_name,
        rounds,
        players,
    })
}

pub fn load_corpus(
    store: &dyn MatchStore,
    config: &FeatureConfig,
    taxonomy: &WeaponTaxonomy,
) -> Result<(Corpus, BatchReport)> {
    let matches = store.stored_matches()?;
    tracing::info!(matches = matches.len(), "Loading parsed matches");

    let mut report = BatchReport::default();
    let mut analyses = Vec::with_capacity(matches.len());
    for match_id in matches {
        let analysed = store
            .load_match(&match_id)
            .and_then(|stored| analyse_match(stored, config, taxonomy));

        match analysed {
            Ok(a) => {
                analyses.push(a);
                report.processed.push(match_id);
            }
            Err(e) => report.skip(&match_id, e),
        }
    }

    let rounds = analyses.iter().flat_map(|m| m.rounds.iter().cloned()).collect();
    Ok((
        Corpus {
            matches: analyses,
            rounds,
        },
        report,
    ))
}

/// The feature stage: every dataset over all parsed matches of `input`, written to `output`.
pub fn build_all(
    input: &dyn MatchStore,
    output: &dyn MatchStore,
    config: &FeatureConfig,
    taxonomy: &WeaponTaxonomy,
) -> Result<BatchReport> {
    let (corpus, report) = load_corpus(input, config, taxonomy)?;
    if corpus.matches.is_empty() {
        tracing::warn!("No parsed matches, writing empty feature tables");
    }

    for dataset in DATASETS.iter() {
        tracing::debug!(dataset = dataset.name(), "Building dataset");
        for table in dataset.build(&corpus) {
            output.write_table(&table)?;
        }
    }

    Ok(report)
}
