use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Source(#[from] analysis::SourceError),

    #[error(transparent)]
    Segment(#[from] analysis::SegmentError),

    #[error("No extractor could unpack '{archive}' (tried {tried})")]
    Extraction { archive: String, tried: String },
}

impl PipelineError {
    pub fn io<P>(path: P, source: std::io::Error) -> Self
    where
        P: Into<std::path::PathBuf>,
    {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
