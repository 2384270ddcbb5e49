pub mod auditor;
pub mod cleanup;
pub mod compiler;
pub mod correction;
pub mod prompts;
pub mod synthesizer;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{
    Attempt, AuditVerdict, CompletionRequest, CorrectionOutcome, Stage, StageSettings, UserInput,
    Verdict,
};
pub use crate::domain::ports::{ArtifactStage, LanguageModel, VerdictPredicate};
pub use crate::utils::error::Result;
