use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use nerostack_application::{AnalysisHistoryQuery, AnalyzeDocumentInput};
use nerostack_core::UserIdentity;
use nerostack_domain::{AnalysisId, AnalysisStatus, DocumentId};

use crate::dto::{
    AnalysisResponse, AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnswerResponse,
    AskQuestionRequest, KeywordsRequest, KeywordsResponse, ModelsResponse, SummaryRequest,
    SummaryResponse, TextGenerationStatusResponse, page_limit, parse_language,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct AnalysisHistoryParams {
    pub document_id: Option<i64>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn analyze_document_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(document_id): Path<i64>,
    payload: Option<Json<AnalyzeDocumentRequest>>,
) -> ApiResult<Json<AnalyzeDocumentResponse>> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let result = state
        .document_analysis_service
        .analyze_document(
            &user,
            DocumentId::new(document_id),
            AnalyzeDocumentInput::try_from(payload)?,
        )
        .await?;

    Ok(Json(AnalyzeDocumentResponse::from(result)))
}

pub async fn summary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(document_id): Path<i64>,
    payload: Option<Json<SummaryRequest>>,
) -> ApiResult<Json<SummaryResponse>> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let language = parse_language(payload.language.as_deref())?;
    let summary = state
        .document_analysis_service
        .summarize(&user, DocumentId::new(document_id), language)
        .await?;

    Ok(Json(SummaryResponse {
        document_id,
        summary,
        language: language.as_str().to_owned(),
    }))
}

pub async fn keywords_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(document_id): Path<i64>,
    payload: Option<Json<KeywordsRequest>>,
) -> ApiResult<Json<KeywordsResponse>> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let language = parse_language(payload.language.as_deref())?;
    let keywords = state
        .document_analysis_service
        .extract_keywords(&user, DocumentId::new(document_id), payload.count(), language)
        .await?;

    Ok(Json(KeywordsResponse {
        document_id,
        count: keywords.len(),
        keywords,
    }))
}

pub async fn ask_question_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(document_id): Path<i64>,
    Json(payload): Json<AskQuestionRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    let language = parse_language(payload.language.as_deref())?;
    let answer = state
        .document_analysis_service
        .ask_question(
            &user,
            DocumentId::new(document_id),
            payload.question.as_str(),
            language,
        )
        .await?;

    Ok(Json(AnswerResponse {
        document_id,
        question: payload.question,
        answer,
    }))
}

pub async fn analysis_history_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<AnalysisHistoryParams>,
) -> ApiResult<Json<Vec<AnalysisResponse>>> {
    let defaults = AnalysisHistoryQuery::default();
    let status = params
        .status
        .as_deref()
        .map(str::parse::<AnalysisStatus>)
        .transpose()?;

    let records = state
        .document_analysis_service
        .history(
            &user,
            AnalysisHistoryQuery {
                document_id: params.document_id.map(DocumentId::new),
                status,
                limit: page_limit(params.limit, defaults.limit),
                offset: params.offset.unwrap_or(0),
            },
        )
        .await?;

    Ok(Json(records.iter().map(AnalysisResponse::from).collect()))
}

pub async fn get_analysis_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Json<AnalysisResponse>> {
    let record = state
        .document_analysis_service
        .get_analysis(&user, AnalysisId::parse(analysis_id.as_str())?)
        .await?;

    Ok(Json(AnalysisResponse::from(&record)))
}

pub async fn text_generation_status_handler(
    State(state): State<AppState>,
) -> Json<TextGenerationStatusResponse> {
    Json(TextGenerationStatusResponse::from(
        state.document_analysis_service.text_generation_status().await,
    ))
}

pub async fn list_models_handler(State(state): State<AppState>) -> ApiResult<Json<ModelsResponse>> {
    let models = state.document_analysis_service.list_models().await?;

    Ok(Json(ModelsResponse { models }))
}
