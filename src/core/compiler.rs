use crate::core::cleanup::clean_diagram;
use crate::core::prompts;
use crate::domain::model::{CompletionRequest, Stage, StageSettings};
use crate::domain::ports::LanguageModel;
use crate::utils::error::Result;
use std::sync::Arc;

/// Diagram Compiler: network description to cleaned flowchart source.
pub struct DiagramCompiler {
    model: Arc<dyn LanguageModel>,
    diagram: StageSettings,
    correction: StageSettings,
    header: String,
}

impl DiagramCompiler {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        diagram: StageSettings,
        correction: StageSettings,
        header: impl Into<String>,
    ) -> Self {
        Self {
            model,
            diagram,
            correction,
            header: header.into(),
        }
    }

    pub async fn compile(&self, network: &str) -> Result<String> {
        let prompt = prompts::diagram_prompt(network, &self.header);
        let raw = self
            .model
            .complete(CompletionRequest::new(Stage::Diagram, prompt, self.diagram))
            .await?;

        Ok(self.clean(&raw))
    }

    pub async fn recompile(&self, network: &str, rejected: &str, defects: &str) -> Result<String> {
        let prompt = prompts::diagram_correction_prompt(network, rejected, defects, &self.header);
        let raw = self
            .model
            .complete(CompletionRequest::new(
                Stage::DiagramCorrection,
                prompt,
                self.correction,
            ))
            .await?;

        Ok(self.clean(&raw))
    }

    fn clean(&self, raw: &str) -> String {
        let diagram = clean_diagram(raw, &self.header);
        tracing::debug!(
            "Diagram cleaned: {} raw lines -> {} lines",
            raw.lines().count(),
            diagram.lines().count()
        );
        diagram
    }
}
