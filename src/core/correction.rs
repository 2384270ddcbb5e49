//! Generate, audit, and at most one regenerate-and-reaudit pass.

use crate::core::auditor::Auditor;
use crate::domain::model::{Attempt, AuditVerdict, CorrectionOutcome};
use crate::domain::ports::ArtifactStage;
use crate::utils::error::Result;

/// Correction passes allowed after a rejected first verdict.
pub const MAX_CORRECTION_PASSES: usize = 1;

/// Latest artifact and verdict text seen so far, kept for error reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionTrace {
    pub artifact: Option<String>,
    pub verdict: Option<String>,
}

impl CorrectionTrace {
    fn record_artifact(&mut self, artifact: &str) {
        self.artifact = Some(artifact.to_string());
    }

    fn record_verdict(&mut self, verdict: &AuditVerdict) {
        self.verdict = Some(verdict.text.clone());
    }
}

pub struct CorrectionLoop<'a> {
    auditor: &'a Auditor,
    max_passes: usize,
}

impl<'a> CorrectionLoop<'a> {
    pub fn new(auditor: &'a Auditor) -> Self {
        Self {
            auditor,
            max_passes: MAX_CORRECTION_PASSES,
        }
    }

    async fn audit<S: ArtifactStage + ?Sized>(
        &self,
        stage: &S,
        artifact: &str,
        trace: &mut CorrectionTrace,
    ) -> Result<AuditVerdict> {
        let verdict = self.auditor.classify(&stage.audit(artifact).await?);
        trace.record_verdict(&verdict);
        tracing::info!(
            "🔎 {} audit verdict: {:?}",
            stage.name(),
            verdict.verdict
        );
        Ok(verdict)
    }

    pub async fn run<S: ArtifactStage + ?Sized>(
        &self,
        stage: &S,
        trace: &mut CorrectionTrace,
    ) -> Result<CorrectionOutcome> {
        let mut artifact = stage.generate().await?;
        trace.record_artifact(&artifact);

        let mut verdict = self.audit(stage, &artifact, trace).await?;
        let mut previous = None;
        let mut corrections = 0;

        while !verdict.is_accepted() && corrections < self.max_passes {
            corrections += 1;
            tracing::info!(
                "🔧 {} rejected, running correction pass {}/{}",
                stage.name(),
                corrections,
                self.max_passes
            );

            let corrected = stage.regenerate(&artifact, &verdict.text).await?;
            trace.record_artifact(&corrected);
            previous = Some(Attempt {
                artifact: std::mem::replace(&mut artifact, corrected),
                verdict,
            });

            verdict = self.audit(stage, &artifact, trace).await?;
        }

        if !verdict.is_accepted() {
            tracing::warn!(
                "⚠️ {} still rejected after {} correction pass(es), returning last attempt",
                stage.name(),
                corrections
            );
        }

        Ok(CorrectionOutcome {
            artifact,
            verdict,
            previous,
            corrections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auditor::PrefixPredicate;
    use crate::core::test_support::ScriptedModel;
    use crate::domain::model::{StageSettings, Verdict};
    use crate::utils::error::ServiceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// 依序回傳預設的產物與審核結果
    struct FakeStage {
        artifacts: Mutex<Vec<&'static str>>,
        verdicts: Mutex<Vec<&'static str>>,
        generated: AtomicUsize,
        regenerated: AtomicUsize,
        audited: AtomicUsize,
        defects_seen: Mutex<Vec<String>>,
        fail_regenerate: bool,
    }

    impl FakeStage {
        fn new(artifacts: Vec<&'static str>, verdicts: Vec<&'static str>) -> Self {
            Self {
                artifacts: Mutex::new(artifacts.into_iter().rev().collect()),
                verdicts: Mutex::new(verdicts.into_iter().rev().collect()),
                generated: AtomicUsize::new(0),
                regenerated: AtomicUsize::new(0),
                audited: AtomicUsize::new(0),
                defects_seen: Mutex::new(Vec::new()),
                fail_regenerate: false,
            }
        }

        fn next_artifact(&self) -> String {
            self.artifacts.lock().unwrap().pop().unwrap().to_string()
        }
    }

    #[async_trait]
    impl ArtifactStage for FakeStage {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn generate(&self) -> Result<String> {
            self.generated.fetch_add(1, Ordering::SeqCst);
            Ok(self.next_artifact())
        }

        async fn audit(&self, _artifact: &str) -> Result<String> {
            self.audited.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdicts.lock().unwrap().pop().unwrap().to_string())
        }

        async fn regenerate(&self, _rejected: &str, defects: &str) -> Result<String> {
            self.regenerated.fetch_add(1, Ordering::SeqCst);
            self.defects_seen.lock().unwrap().push(defects.to_string());
            if self.fail_regenerate {
                return Err(ServiceError::UpstreamError {
                    status: 503,
                    message: "overloaded".to_string(),
                });
            }
            Ok(self.next_artifact())
        }
    }

    fn auditor() -> Auditor {
        Auditor::new(
            Arc::new(ScriptedModel::new(vec![])),
            StageSettings::new(0.1, 700),
            StageSettings::new(0.1, 700),
            Arc::new(PrefixPredicate::default()),
        )
    }

    #[tokio::test]
    async fn test_accepted_first_verdict_skips_correction() {
        let auditor = auditor();
        let stage = FakeStage::new(vec!["net v1"], vec!["VALID: complete"]);
        let mut trace = CorrectionTrace::default();

        let outcome = CorrectionLoop::new(&auditor).run(&stage, &mut trace).await.unwrap();

        assert_eq!(outcome.artifact, "net v1");
        assert!(outcome.verdict.is_accepted());
        assert_eq!(outcome.corrections, 0);
        assert!(outcome.previous.is_none());
        assert_eq!(stage.regenerated.load(Ordering::SeqCst), 0);
        assert_eq!(stage.audited.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_verdict_triggers_exactly_one_correction() {
        let auditor = auditor();
        let stage = FakeStage::new(
            vec!["net v1", "net v2"],
            vec!["Node Risk: missing CPT", "VALID: complete"],
        );
        let mut trace = CorrectionTrace::default();

        let outcome = CorrectionLoop::new(&auditor).run(&stage, &mut trace).await.unwrap();

        assert_eq!(outcome.artifact, "net v2");
        assert!(outcome.verdict.is_accepted());
        assert_eq!(outcome.corrections, 1);
        let previous = outcome.previous.unwrap();
        assert_eq!(previous.artifact, "net v1");
        assert_eq!(previous.verdict.text, "Node Risk: missing CPT");
        assert_eq!(
            *stage.defects_seen.lock().unwrap(),
            vec!["Node Risk: missing CPT".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_rejection_is_returned_without_another_pass() {
        let auditor = auditor();
        let stage = FakeStage::new(
            vec!["net v1", "net v2"],
            vec!["missing states", "still missing states"],
        );
        let mut trace = CorrectionTrace::default();

        let outcome = CorrectionLoop::new(&auditor).run(&stage, &mut trace).await.unwrap();

        assert_eq!(outcome.artifact, "net v2");
        assert_eq!(outcome.verdict.verdict, Verdict::Rejected);
        assert_eq!(outcome.verdict.text, "still missing states");
        assert_eq!(outcome.corrections, MAX_CORRECTION_PASSES);
        assert_eq!(stage.generated.load(Ordering::SeqCst), 1);
        assert_eq!(stage.regenerated.load(Ordering::SeqCst), 1);
        assert_eq!(stage.audited.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_trace_keeps_partial_results_on_failure() {
        let auditor = auditor();
        let mut stage = FakeStage::new(vec!["net v1"], vec!["NOT VALID: gaps"]);
        stage.fail_regenerate = true;
        let mut trace = CorrectionTrace::default();

        let result = CorrectionLoop::new(&auditor).run(&stage, &mut trace).await;

        assert!(result.is_err());
        assert_eq!(trace.artifact.as_deref(), Some("net v1"));
        assert_eq!(trace.verdict.as_deref(), Some("NOT VALID: gaps"));
    }
}
