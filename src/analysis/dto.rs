use serde::{Deserialize, Serialize};

use super::{
    encoder::AnalysisEncoding,
    error::AnalysisError,
    normalizer::AnalysisResult,
    orchestrator::{AnalysisState, Checkpoint},
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub encoding: Option<AnalysisEncoding>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub state: AnalysisState,
    pub encoding: AnalysisEncoding,
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub progress: Vec<Checkpoint>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<&AnalysisError> for ErrorBody {
    fn from(e: &AnalysisError) -> Self {
        let (status, body) = match e {
            AnalysisError::UpstreamStatus { status, body } => (Some(*status), Some(body.clone())),
            _ => (None, None),
        };
        Self {
            kind: e.kind(),
            message: e.to_string(),
            status,
            body,
        }
    }
}
