use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

pub use conversions::parse_language;

/// Incoming payload for a cached full analysis.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/analyze-document-request.ts"
)]
pub struct AnalyzeDocumentRequest {
    pub language: Option<String>,
    pub force_refresh: Option<bool>,
    pub document_version: Option<String>,
}

/// Incoming payload for an uncached summary.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/summary-request.ts"
)]
pub struct SummaryRequest {
    pub language: Option<String>,
}

/// Incoming payload for keyword extraction.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/keywords-request.ts"
)]
pub struct KeywordsRequest {
    pub count: Option<usize>,
    pub language: Option<String>,
}

/// Incoming payload for a question about a document.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/ask-question-request.ts"
)]
pub struct AskQuestionRequest {
    pub question: String,
    pub language: Option<String>,
}

/// API representation of a stored analysis record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/analysis-response.ts"
)]
pub struct AnalysisResponse {
    pub analysis_id: String,
    pub document_id: i64,
    pub document_version: Option<String>,
    pub language: String,
    pub principal_id: String,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub key_points: Vec<String>,
    pub model_used: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub processing_seconds: Option<f64>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Result of an analyze call and whether it came from cache.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/analyze-document-response.ts"
)]
pub struct AnalyzeDocumentResponse {
    pub analysis: AnalysisResponse,
    pub cached: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/summary-response.ts"
)]
pub struct SummaryResponse {
    pub document_id: i64,
    pub summary: String,
    pub language: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/keywords-response.ts"
)]
pub struct KeywordsResponse {
    pub document_id: i64,
    pub keywords: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/answer-response.ts"
)]
pub struct AnswerResponse {
    pub document_id: i64,
    pub question: String,
    pub answer: String,
}

/// Full extracted text of a document.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/document-content-response.ts"
)]
pub struct DocumentContentResponse {
    pub document_id: i64,
    pub content: String,
    pub length: usize,
}

/// Reachability of the text generation provider.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/text-generation-status-response.ts"
)]
pub struct TextGenerationStatusResponse {
    pub status: String,
    pub current_model: String,
    pub available_models: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/models-response.ts"
)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}
