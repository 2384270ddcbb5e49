use crate::domain::model::CompletionRequest;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Text-generation service treated as an opaque oracle.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Decides whether an auditor's free-text reply accepts the artifact.
pub trait VerdictPredicate: Send + Sync {
    fn accepts(&self, verdict_text: &str) -> bool;
}

impl<F> VerdictPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accepts(&self, verdict_text: &str) -> bool {
        self(verdict_text)
    }
}

/// An artifact that can be generated, audited and regenerated from a defect list.
#[async_trait]
pub trait ArtifactStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self) -> Result<String>;

    /// Returns the auditor's raw reply for `artifact`.
    async fn audit(&self, artifact: &str) -> Result<String>;

    async fn regenerate(&self, rejected: &str, defects: &str) -> Result<String>;
}
