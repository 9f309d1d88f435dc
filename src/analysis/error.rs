use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis webhook URL is not configured")]
    Configuration,
    #[error("webhook request failed: {0}")]
    Transport(String),
    #[error("webhook responded with status {status}")]
    UpstreamStatus { status: u16, body: String },
    #[error("could not parse webhook response: {snippet}")]
    Parse { snippet: String },
    #[error("could not encode image payload: {0}")]
    Encoding(String),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Configuration => "configuration",
            AnalysisError::Transport(_) => "transport",
            AnalysisError::UpstreamStatus { .. } => "upstream_status",
            AnalysisError::Parse { .. } => "parse",
            AnalysisError::Encoding(_) => "encoding",
        }
    }
}
