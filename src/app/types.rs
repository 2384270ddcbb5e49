//! Request and response bodies for the HTTP endpoints.

use crate::core::correction::CorrectionTrace;
use serde::{Deserialize, Serialize};

/// Body of `POST /generate-network`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateNetworkRequest {
    pub json_data: Option<String>,
    pub situation_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateNetworkResponse {
    pub bayes_net: String,
    pub judge_verdict: String,
}

/// Body of `POST /generate-mermaid`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMermaidRequest {
    pub network_output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousAttempt {
    pub mermaid_code: String,
    pub judge_verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMermaidResponse {
    pub mermaid_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_verdict: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attempt: Option<PreviousAttempt>,
}

/// Error body; carries whatever partial artifacts were produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bayes_net: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mermaid_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_verdict: Option<String>,
}

/// Which artifact field the partial result of a failed request goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialKind {
    Network,
    Diagram,
}

impl ErrorResponse {
    pub fn with_partial(mut self, kind: PartialKind, trace: CorrectionTrace) -> Self {
        match kind {
            PartialKind::Network => self.bayes_net = trace.artifact,
            PartialKind::Diagram => self.mermaid_code = trace.artifact,
        }
        self.judge_verdict = trace.verdict;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}
