use crate::core::prompts;
use crate::domain::model::{AuditVerdict, CompletionRequest, Stage, StageSettings, Verdict};
use crate::domain::ports::{LanguageModel, VerdictPredicate};
use crate::utils::error::Result;
use std::sync::Arc;

pub const DEFAULT_VALID_PREFIX: &str = "VALID";

/// Accepts a verdict when its trimmed text starts with `prefix` at position 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixPredicate {
    prefix: String,
    case_sensitive: bool,
}

impl PrefixPredicate {
    pub fn new(prefix: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            prefix: prefix.into(),
            case_sensitive,
        }
    }
}

impl Default for PrefixPredicate {
    fn default() -> Self {
        Self::new(DEFAULT_VALID_PREFIX, true)
    }
}

impl VerdictPredicate for PrefixPredicate {
    fn accepts(&self, verdict_text: &str) -> bool {
        let text = verdict_text.trim();
        if self.case_sensitive {
            text.starts_with(&self.prefix)
        } else {
            text.get(..self.prefix.len())
                .map(|head| head.eq_ignore_ascii_case(&self.prefix))
                .unwrap_or(false)
        }
    }
}

/// Auditor: asks the model to check an artifact and classifies the reply.
pub struct Auditor {
    model: Arc<dyn LanguageModel>,
    network_audit: StageSettings,
    diagram_audit: StageSettings,
    predicate: Arc<dyn VerdictPredicate>,
    valid_prefix: String,
}

impl Auditor {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        network_audit: StageSettings,
        diagram_audit: StageSettings,
        predicate: Arc<dyn VerdictPredicate>,
    ) -> Self {
        Self {
            model,
            network_audit,
            diagram_audit,
            predicate,
            valid_prefix: DEFAULT_VALID_PREFIX.to_string(),
        }
    }

    /// 提示中要求模型回覆的前綴，需與判定條件一致
    pub fn with_valid_prefix(mut self, valid_prefix: impl Into<String>) -> Self {
        self.valid_prefix = valid_prefix.into();
        self
    }

    pub fn classify(&self, verdict_text: &str) -> AuditVerdict {
        let text = verdict_text.trim().to_string();
        let verdict = if self.predicate.accepts(&text) {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        };
        AuditVerdict { text, verdict }
    }

    pub async fn audit_network(&self, network: &str) -> Result<String> {
        let prompt = prompts::network_audit_prompt(network, &self.valid_prefix);
        let text = self
            .model
            .complete(CompletionRequest::new(Stage::Audit, prompt, self.network_audit))
            .await?;
        Ok(text.trim().to_string())
    }

    pub async fn audit_diagram(&self, network: &str, diagram: &str) -> Result<String> {
        let prompt = prompts::diagram_audit_prompt(network, diagram, &self.valid_prefix);
        let text = self
            .model
            .complete(CompletionRequest::new(
                Stage::DiagramAudit,
                prompt,
                self.diagram_audit,
            ))
            .await?;
        Ok(text.trim().to_string())
    }
}
