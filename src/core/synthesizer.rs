use crate::core::prompts;
use crate::domain::model::{CompletionRequest, Stage, StageSettings, UserInput};
use crate::domain::ports::LanguageModel;
use crate::utils::error::Result;
use std::sync::Arc;

/// Network Synthesizer: asks the model for a textual Bayesian network.
pub struct NetworkSynthesizer {
    model: Arc<dyn LanguageModel>,
    synthesis: StageSettings,
    correction: StageSettings,
}

impl NetworkSynthesizer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        synthesis: StageSettings,
        correction: StageSettings,
    ) -> Self {
        Self {
            model,
            synthesis,
            correction,
        }
    }

    pub async fn synthesize(&self, input: &UserInput) -> Result<String> {
        let prompt = prompts::synthesis_prompt(input);
        tracing::debug!("Synthesis prompt built ({} chars)", prompt.len());

        let text = self
            .model
            .complete(CompletionRequest::new(Stage::Synthesis, prompt, self.synthesis))
            .await?;

        let network = text.trim().to_string();
        tracing::info!("🧠 Network synthesized ({} chars)", network.len());
        Ok(network)
    }

    /// 依審核意見重新產生網路
    pub async fn regenerate(&self, input: &UserInput, defects: &str) -> Result<String> {
        let prompt = prompts::network_correction_prompt(input, defects);
        tracing::debug!("Correction prompt built ({} chars)", prompt.len());

        let text = self
            .model
            .complete(CompletionRequest::new(Stage::Correction, prompt, self.correction))
            .await?;

        Ok(text.trim().to_string())
    }
}
