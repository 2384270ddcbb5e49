use crate::utils::error::Result;
use crate::utils::validation::{parse_json_text, require_fields};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 已驗證的使用者輸入：JSON 資料與情境描述
#[derive(Debug, Clone, PartialEq)]
pub struct UserInput {
    pub json_data: serde_json::Value,
    pub situation_description: String,
}

impl UserInput {
    /// 在任何 LLM 呼叫之前驗證原始欄位
    pub fn from_raw(json_data: Option<&str>, situation_description: Option<&str>) -> Result<Self> {
        require_fields(&[
            ("jsonData", json_data),
            ("situationDescription", situation_description),
        ])?;

        let json_data = parse_json_text(json_data.unwrap_or_default())?;

        Ok(Self {
            json_data,
            situation_description: situation_description.unwrap_or_default().to_string(),
        })
    }

    /// JSON 資料以兩格縮排重新序列化，用於嵌入提示詞
    pub fn pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.json_data).unwrap_or_else(|_| self.json_data.to_string())
    }
}

/// Which LLM call a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Synthesis,
    Audit,
    Correction,
    Diagram,
    DiagramAudit,
    DiagramCorrection,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Synthesis => "synthesis",
            Stage::Audit => "audit",
            Stage::Correction => "correction",
            Stage::Diagram => "diagram",
            Stage::DiagramAudit => "diagram_audit",
            Stage::DiagramCorrection => "diagram_correction",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling parameters for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl StageSettings {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub stage: Stage,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(stage: Stage, prompt: String, settings: StageSettings) -> Self {
        Self {
            stage,
            prompt,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

/// 審核結果：模型原文加上分類
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditVerdict {
    pub text: String,
    pub verdict: Verdict,
}

impl AuditVerdict {
    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }
}

/// One generated artifact and the verdict it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub artifact: String,
    pub verdict: AuditVerdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub artifact: String,
    pub verdict: AuditVerdict,
    /// The rejected attempt, present only when a correction pass ran.
    pub previous: Option<Attempt>,
    pub corrections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ServiceError;

    #[test]
    fn test_user_input_from_raw() {
        let input = UserInput::from_raw(Some("{\"age\":30}"), Some("loan approval")).unwrap();
        assert_eq!(input.json_data["age"], 30);
        assert_eq!(input.situation_description, "loan approval");
        assert_eq!(input.pretty_json(), "{\n  \"age\": 30\n}");
    }

    #[test]
    fn test_user_input_rejects_missing_and_invalid() {
        assert!(matches!(
            UserInput::from_raw(None, Some("loan approval")),
            Err(ServiceError::MissingFieldsError { .. })
        ));
        assert!(matches!(
            UserInput::from_raw(Some("{\"age\":30}"), Some("")),
            Err(ServiceError::MissingFieldsError { .. })
        ));
        assert!(matches!(
            UserInput::from_raw(Some("{\"age\":"), Some("loan approval")),
            Err(ServiceError::InvalidJsonError { .. })
        ));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::DiagramAudit.to_string(), "diagram_audit");
        assert_eq!(
            serde_json::to_string(&Stage::DiagramCorrection).unwrap(),
            "\"diagram_correction\""
        );
    }
}
