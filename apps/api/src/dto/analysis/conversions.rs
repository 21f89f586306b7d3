use nerostack_application::{
    AnalyzeDocumentInput, AnalyzeDocumentResult, DEFAULT_KEYWORD_COUNT, TextGenerationStatus,
};
use nerostack_core::AppResult;
use nerostack_domain::{AnalysisLanguage, AnalysisRecord};

use super::{
    AnalysisResponse, AnalyzeDocumentRequest, AnalyzeDocumentResponse, KeywordsRequest,
    TextGenerationStatusResponse,
};

/// Parses an optional language code, defaulting to French.
pub fn parse_language(language: Option<&str>) -> AppResult<AnalysisLanguage> {
    language
        .filter(|language| !language.trim().is_empty())
        .map(str::parse::<AnalysisLanguage>)
        .transpose()
        .map(Option::unwrap_or_default)
}

impl TryFrom<AnalyzeDocumentRequest> for AnalyzeDocumentInput {
    type Error = nerostack_core::AppError;

    fn try_from(value: AnalyzeDocumentRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            language: parse_language(value.language.as_deref())?,
            force_refresh: value.force_refresh.unwrap_or(false),
            document_version: value
                .document_version
                .map(|version| version.trim().to_owned())
                .filter(|version| !version.is_empty()),
        })
    }
}

impl KeywordsRequest {
    /// Requested keyword count, falling back to the service default.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.unwrap_or(DEFAULT_KEYWORD_COUNT)
    }
}

impl From<&AnalysisRecord> for AnalysisResponse {
    fn from(value: &AnalysisRecord) -> Self {
        Self {
            analysis_id: value.id().to_string(),
            document_id: value.document_id().value(),
            document_version: value.document_version().map(str::to_owned),
            language: value.language().as_str().to_owned(),
            principal_id: value.principal_id().to_string(),
            summary: value.summary().map(str::to_owned),
            keywords: value.keywords().to_vec(),
            key_points: value.key_points().to_vec(),
            model_used: value.model_used().map(str::to_owned),
            status: value.status().as_str().to_owned(),
            error_message: value.error_message().map(str::to_owned),
            processing_seconds: value.processing_seconds(),
            created_at: value.created_at().to_rfc3339(),
            completed_at: value
                .completed_at()
                .map(|completed_at| completed_at.to_rfc3339()),
        }
    }
}

impl From<AnalyzeDocumentResult> for AnalyzeDocumentResponse {
    fn from(value: AnalyzeDocumentResult) -> Self {
        Self {
            analysis: AnalysisResponse::from(&value.record),
            cached: value.cached,
        }
    }
}

impl From<TextGenerationStatus> for TextGenerationStatusResponse {
    fn from(value: TextGenerationStatus) -> Self {
        Self {
            status: if value.available {
                "available"
            } else {
                "unavailable"
            }
            .to_owned(),
            current_model: value.current_model,
            available_models: value.available_models,
        }
    }
}

#[cfg(test)]
mod tests {
    use nerostack_application::{AnalyzeDocumentInput, TextGenerationStatus};
    use nerostack_core::AppError;
    use nerostack_domain::AnalysisLanguage;

    use super::parse_language;
    use crate::dto::{AnalyzeDocumentRequest, KeywordsRequest, TextGenerationStatusResponse};

    #[test]
    fn language_defaults_to_french() {
        assert!(matches!(parse_language(None), Ok(AnalysisLanguage::Fr)));
        assert!(matches!(parse_language(Some(" ")), Ok(AnalysisLanguage::Fr)));
        assert!(matches!(parse_language(Some("EN")), Ok(AnalysisLanguage::En)));
        assert!(matches!(
            parse_language(Some("de")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn analyze_request_normalises_blank_version() {
        let input = AnalyzeDocumentInput::try_from(AnalyzeDocumentRequest {
            language: Some("en".to_owned()),
            force_refresh: None,
            document_version: Some("  ".to_owned()),
        })
        .unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(input.language, AnalysisLanguage::En);
        assert!(!input.force_refresh);
        assert!(input.document_version.is_none());
    }

    #[test]
    fn keyword_count_falls_back_to_default() {
        assert_eq!(KeywordsRequest::default().count(), 10);
        assert_eq!(
            KeywordsRequest {
                count: Some(3),
                language: None
            }
            .count(),
            3
        );
    }

    #[test]
    fn unavailable_provider_reports_unavailable_status() {
        let response = TextGenerationStatusResponse::from(TextGenerationStatus {
            available: false,
            current_model: "llama3.2".to_owned(),
            available_models: Vec::new(),
        });
        assert_eq!(response.status, "unavailable");
        assert_eq!(response.current_model, "llama3.2");
    }
}
