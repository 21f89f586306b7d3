//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod mayan_document_content_provider;
mod ollama_text_generation_provider;
mod postgres_access_window_repository;
mod postgres_analysis_repository;
mod postgres_audit_repository;
mod postgres_principal_repository;

pub use mayan_document_content_provider::{MayanCredentials, MayanDocumentContentProvider};
pub use ollama_text_generation_provider::{GenerationOptions, OllamaTextGenerationProvider};
pub use postgres_access_window_repository::PostgresAccessWindowRepository;
pub use postgres_analysis_repository::{ABANDONED_ANALYSIS_MESSAGE, PostgresAnalysisRepository};
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
