use serde::Serialize;

use super::upload::ImageSummary;
use crate::analysis::normalizer::AnalysisResult;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub image: ImageSummary,
    pub preview_url: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub image: Option<ImageSummary>,
    pub preview_url: Option<String>,
    pub last_result: Option<AnalysisResult>,
}
