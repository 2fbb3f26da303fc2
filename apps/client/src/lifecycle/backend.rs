use async_trait::async_trait;

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::models::{
    AnalyzeRequest, EnhanceRequest, EnhancedResume, Resume, SuggestionRequest, TranslateRequest,
};

/// The calls the lifecycle tracker makes. Implement this to drive a tracker
/// from something other than the live backend.
///
/// Held by the tracker as `Arc<dyn ResumeBackend>`.
#[async_trait]
pub trait ResumeBackend: Send + Sync {
    async fn get_resume(&self, id: i64) -> Result<Resume, ClientError>;

    async fn get_enhanced_versions(&self, resume_id: i64)
        -> Result<Vec<EnhancedResume>, ClientError>;

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<EnhancedResume, ClientError>;

    async fn enhance(&self, request: &EnhanceRequest) -> Result<EnhancedResume, ClientError>;

    async fn suggestions(&self, request: &SuggestionRequest) -> Result<Vec<String>, ClientError>;

    async fn translate(&self, request: &TranslateRequest) -> Result<EnhancedResume, ClientError>;
}

#[async_trait]
impl ResumeBackend for ApiClient {
    async fn get_resume(&self, id: i64) -> Result<Resume, ClientError> {
        ApiClient::get_resume(self, id).await
    }

    async fn get_enhanced_versions(
        &self,
        resume_id: i64,
    ) -> Result<Vec<EnhancedResume>, ClientError> {
        ApiClient::get_enhanced_versions(self, resume_id).await
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<EnhancedResume, ClientError> {
        ApiClient::analyze(self, request).await
    }

    async fn enhance(&self, request: &EnhanceRequest) -> Result<EnhancedResume, ClientError> {
        ApiClient::enhance(self, request).await
    }

    async fn suggestions(&self, request: &SuggestionRequest) -> Result<Vec<String>, ClientError> {
        Ok(ApiClient::suggestions(self, request).await?.suggestions)
    }

    async fn translate(&self, request: &TranslateRequest) -> Result<EnhancedResume, ClientError> {
        ApiClient::translate(self, request).await
    }
}
