use crate::adapters::OpenAiClient;
use crate::app::pipelines::{DiagramPipeline, NetworkPipeline};
use crate::config::ServiceConfig;
use crate::core::auditor::Auditor;
use crate::core::compiler::DiagramCompiler;
use crate::core::synthesizer::NetworkSynthesizer;
use crate::core::{LanguageModel, Stage, VerdictPredicate};
use std::sync::Arc;

/// Shared, read-only state for every request.
pub struct AppState {
    pub network: NetworkPipeline,
    pub diagram: DiagramPipeline,
    pub model_name: String,
}

impl AppState {
    /// Wire the pipelines around any language model.
    pub fn new(config: &ServiceConfig, model: Arc<dyn LanguageModel>) -> Self {
        Self::with_predicate(config, model, Arc::new(config.verdict_predicate()))
    }

    pub fn with_predicate(
        config: &ServiceConfig,
        model: Arc<dyn LanguageModel>,
        predicate: Arc<dyn VerdictPredicate>,
    ) -> Self {
        let auditor = Arc::new(Auditor::new(
            model.clone(),
            config.stage(Stage::Audit),
            config.stage(Stage::DiagramAudit),
            predicate,
        )
        .with_valid_prefix(config.audit.valid_prefix.clone()));

        let synthesizer = NetworkSynthesizer::new(
            model.clone(),
            config.stage(Stage::Synthesis),
            config.stage(Stage::Correction),
        );

        let compiler = DiagramCompiler::new(
            model,
            config.stage(Stage::Diagram),
            config.stage(Stage::DiagramCorrection),
            config.diagram.header.clone(),
        );

        Self {
            network: NetworkPipeline::new(synthesizer, auditor.clone()),
            diagram: DiagramPipeline::new(compiler, auditor, config.audit.audit_diagrams),
            model_name: config.llm.model.clone(),
        }
    }

    /// State backed by the OpenAI-compatible client described in `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let api_key = config.resolved_api_key();
        if api_key.is_empty() {
            tracing::warn!(
                "⚠️ No API key configured (llm.api_key or {}); requests will be sent unauthenticated",
                crate::config::toml_config::API_KEY_ENV
            );
        }

        let client = OpenAiClient::new(config.llm.endpoint.clone(), api_key, config.llm.model.clone())
            .with_timeout(config.llm.timeout_seconds);

        Self::new(config, Arc::new(client))
    }
}
