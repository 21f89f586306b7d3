mod access;
mod analysis;
mod common;
mod users;

pub use access::{
    AccessDashboardCountsResponse, AccessDashboardResponse, AccessDecisionResponse,
    AccessWindowResponse, AccessibleDocumentsResponse, CreateAccessWindowRequest,
    UpdateAccessWindowRequest,
};
pub use analysis::{
    AnalysisResponse, AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnswerResponse,
    AskQuestionRequest, DocumentContentResponse, KeywordsRequest, KeywordsResponse,
    ModelsResponse, SummaryRequest, SummaryResponse, TextGenerationStatusResponse,
    parse_language,
};
pub use common::{
    BootstrapRequest, DependencyHealthResponse, DetailedHealthResponse, HealthResponse,
    UserIdentityResponse, page_limit,
};
pub use users::{CreatePrincipalRequest, UpdatePrincipalRequest};
