use crate::core::auditor::Auditor;
use crate::core::compiler::DiagramCompiler;
use crate::core::correction::{CorrectionLoop, CorrectionTrace};
use crate::core::{ArtifactStage, Attempt, AuditVerdict, Result};
use async_trait::async_trait;
use std::sync::Arc;

struct DiagramStage<'a> {
    compiler: &'a DiagramCompiler,
    auditor: &'a Auditor,
    network: &'a str,
}

#[async_trait]
impl<'a> ArtifactStage for DiagramStage<'a> {
    fn name(&self) -> &'static str {
        "diagram"
    }

    async fn generate(&self) -> Result<String> {
        self.compiler.compile(self.network).await
    }

    async fn audit(&self, artifact: &str) -> Result<String> {
        self.auditor.audit_diagram(self.network, artifact).await
    }

    async fn regenerate(&self, rejected: &str, defects: &str) -> Result<String> {
        self.compiler.recompile(self.network, rejected, defects).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramOutcome {
    pub diagram: String,
    /// `None` when diagram auditing is disabled.
    pub verdict: Option<AuditVerdict>,
    pub previous: Option<Attempt>,
}

/// Diagram Compiler, optionally followed by audit and one correction pass.
pub struct DiagramPipeline {
    compiler: DiagramCompiler,
    auditor: Arc<Auditor>,
    audit_enabled: bool,
}

impl DiagramPipeline {
    pub fn new(compiler: DiagramCompiler, auditor: Arc<Auditor>, audit_enabled: bool) -> Self {
        Self {
            compiler,
            auditor,
            audit_enabled,
        }
    }

    pub async fn run(&self, network: &str, trace: &mut CorrectionTrace) -> Result<DiagramOutcome> {
        tracing::info!("📐 Compiling diagram from network ({} chars)", network.len());

        let stage = DiagramStage {
            compiler: &self.compiler,
            auditor: &self.auditor,
            network,
        };

        if !self.audit_enabled {
            let diagram = stage.generate().await?;
            trace.artifact = Some(diagram.clone());
            tracing::info!("✅ Diagram compiled ({} lines, audit disabled)", diagram.lines().count());
            return Ok(DiagramOutcome {
                diagram,
                verdict: None,
                previous: None,
            });
        }

        let outcome = CorrectionLoop::new(&self.auditor).run(&stage, trace).await?;
        tracing::info!(
            "✅ Diagram pipeline finished: accepted={}, corrections={}",
            outcome.verdict.is_accepted(),
            outcome.corrections
        );

        Ok(DiagramOutcome {
            diagram: outcome.artifact,
            verdict: Some(outcome.verdict),
            previous: outcome.previous,
        })
    }
}
