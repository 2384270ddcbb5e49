use crate::core::auditor::Auditor;
use crate::core::correction::{CorrectionLoop, CorrectionTrace};
use crate::core::synthesizer::NetworkSynthesizer;
use crate::core::{ArtifactStage, CorrectionOutcome, Result, UserInput};
use async_trait::async_trait;
use std::sync::Arc;

/// 單次請求的網路產生階段
struct NetworkStage<'a> {
    synthesizer: &'a NetworkSynthesizer,
    auditor: &'a Auditor,
    input: &'a UserInput,
}

#[async_trait]
impl<'a> ArtifactStage for NetworkStage<'a> {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn generate(&self) -> Result<String> {
        self.synthesizer.synthesize(self.input).await
    }

    async fn audit(&self, artifact: &str) -> Result<String> {
        self.auditor.audit_network(artifact).await
    }

    async fn regenerate(&self, _rejected: &str, defects: &str) -> Result<String> {
        self.synthesizer.regenerate(self.input, defects).await
    }
}

/// Synthesizer, then Auditor, then at most one correction pass.
pub struct NetworkPipeline {
    synthesizer: NetworkSynthesizer,
    auditor: Arc<Auditor>,
}

impl NetworkPipeline {
    pub fn new(synthesizer: NetworkSynthesizer, auditor: Arc<Auditor>) -> Self {
        Self {
            synthesizer,
            auditor,
        }
    }

    pub async fn run(&self, input: &UserInput, trace: &mut CorrectionTrace) -> Result<CorrectionOutcome> {
        tracing::info!(
            "🚀 Generating Bayesian network for situation ({} chars)",
            input.situation_description.len()
        );

        let stage = NetworkStage {
            synthesizer: &self.synthesizer,
            auditor: &self.auditor,
            input,
        };
        let outcome = CorrectionLoop::new(&self.auditor).run(&stage, trace).await?;

        tracing::info!(
            "✅ Network pipeline finished: accepted={}, corrections={}",
            outcome.verdict.is_accepted(),
            outcome.corrections
        );
        Ok(outcome)
    }
}
