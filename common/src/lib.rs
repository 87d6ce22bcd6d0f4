pub mod tables;

/// Optional per-match metadata exported next to the event tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchHeader {
    #[serde(default)]
    pub map_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkippedMatch {
    pub match_id: String,
    pub reason: String,
}

/// Written next to the outputs of every stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchSummary {
    pub stage: String,
    pub processed: Vec<String>,
    pub skipped: Vec<SkippedMatch>,
    pub fallback_events: usize,
}
