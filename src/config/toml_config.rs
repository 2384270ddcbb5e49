use crate::core::auditor::{PrefixPredicate, DEFAULT_VALID_PREFIX};
use crate::core::cleanup::DEFAULT_DIAGRAM_HEADER;
use crate::domain::model::{Stage, StageSettings};
use crate::utils::error::{Result, ServiceError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub stages: StagesConfig,
    pub audit: AuditConfig,
    pub diagram: DiagramConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Sampling parameters per stage. A `[stages.<stage>]` section may set any
/// subset of keys; the rest keep that stage's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StageOverrides")]
pub struct StagesConfig {
    pub synthesis: StageSettings,
    pub audit: StageSettings,
    pub correction: StageSettings,
    pub diagram: StageSettings,
    pub diagram_audit: StageSettings,
    pub diagram_correction: StageSettings,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            synthesis: StageSettings::new(0.7, 6000),
            audit: StageSettings::new(0.1, 700),
            correction: StageSettings::new(0.65, 2200),
            diagram: StageSettings::new(0.3, 1000),
            diagram_audit: StageSettings::new(0.1, 700),
            diagram_correction: StageSettings::new(0.3, 1000),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct StageOverride {
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl StageOverride {
    fn apply(self, base: StageSettings) -> StageSettings {
        StageSettings {
            temperature: self.temperature.unwrap_or(base.temperature),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StageOverrides {
    synthesis: StageOverride,
    audit: StageOverride,
    correction: StageOverride,
    diagram: StageOverride,
    diagram_audit: StageOverride,
    diagram_correction: StageOverride,
}

impl From<StageOverrides> for StagesConfig {
    fn from(overrides: StageOverrides) -> Self {
        let defaults = StagesConfig::default();
        Self {
            synthesis: overrides.synthesis.apply(defaults.synthesis),
            audit: overrides.audit.apply(defaults.audit),
            correction: overrides.correction.apply(defaults.correction),
            diagram: overrides.diagram.apply(defaults.diagram),
            diagram_audit: overrides.diagram_audit.apply(defaults.diagram_audit),
            diagram_correction: overrides.diagram_correction.apply(defaults.diagram_correction),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub valid_prefix: String,
    pub case_sensitive: bool,
    pub audit_diagrams: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            valid_prefix: DEFAULT_VALID_PREFIX.to_string(),
            case_sensitive: true,
            audit_diagrams: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub header: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_DIAGRAM_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    pub verbose: bool,
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ServiceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ServiceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ServiceError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind_address", &self.server.bind_address)?;
        validation::validate_url("llm.endpoint", &self.llm.endpoint)?;
        validation::validate_non_empty_string("llm.model", &self.llm.model)?;

        if let Some(timeout) = self.llm.timeout_seconds {
            validation::validate_positive_number("llm.timeout_seconds", timeout as usize, 1)?;
        }

        for stage in ALL_STAGES {
            let settings = self.stage(stage);
            let field = format!("stages.{}", stage);
            validation::validate_range(
                &format!("{}.temperature", field),
                settings.temperature,
                0.0,
                2.0,
            )?;
            validation::validate_positive_number(
                &format!("{}.max_tokens", field),
                settings.max_tokens as usize,
                1,
            )?;
        }

        validation::validate_non_empty_string("audit.valid_prefix", &self.audit.valid_prefix)?;
        validation::validate_non_empty_string("diagram.header", &self.diagram.header)?;

        Ok(())
    }

    /// 取得各階段的取樣參數
    pub fn stage(&self, stage: Stage) -> StageSettings {
        match stage {
            Stage::Synthesis => self.stages.synthesis,
            Stage::Audit => self.stages.audit,
            Stage::Correction => self.stages.correction,
            Stage::Diagram => self.stages.diagram,
            Stage::DiagramAudit => self.stages.diagram_audit,
            Stage::DiagramCorrection => self.stages.diagram_correction,
        }
    }

    /// API key from the file, falling back to the environment.
    pub fn resolved_api_key(&self) -> String {
        let key = self.llm.api_key.trim();
        if key.is_empty() || key.starts_with("${") {
            std::env::var(API_KEY_ENV).unwrap_or_default()
        } else {
            key.to_string()
        }
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        validation::validate_socket_addr("server.bind_address", &self.server.bind_address)
    }

    pub fn verdict_predicate(&self) -> PrefixPredicate {
        PrefixPredicate::new(self.audit.valid_prefix.clone(), self.audit.case_sensitive)
    }
}

const ALL_STAGES: [Stage; 6] = [
    Stage::Synthesis,
    Stage::Audit,
    Stage::Correction,
    Stage::Diagram,
    Stage::DiagramAudit,
    Stage::DiagramCorrection,
];

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::VerdictPredicate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.timeout_seconds, None);
        assert_eq!(config.stage(Stage::Synthesis), StageSettings::new(0.7, 6000));
        assert_eq!(config.stage(Stage::Correction), StageSettings::new(0.65, 2200));
        assert_eq!(config.diagram.header, "flowchart TD");
        assert!(config.audit.audit_diagrams);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
bind_address = "0.0.0.0:8080"

[llm]
endpoint = "http://localhost:11434/v1"
api_key = "ollama"
model = "llama3"
timeout_seconds = 120

[stages.audit]
temperature = 0.0
max_tokens = 900

[audit]
valid_prefix = "OK"
case_sensitive = false
audit_diagrams = false

[diagram]
header = "graph TD"

[logging]
json = true
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address().unwrap().port(), 8080);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.resolved_api_key(), "ollama");
        assert_eq!(config.llm.timeout_seconds, Some(120));
        assert_eq!(config.stage(Stage::Audit), StageSettings::new(0.0, 900));
        assert_eq!(config.stage(Stage::Diagram), StageSettings::new(0.3, 1000));
        assert!(!config.audit.audit_diagrams);
        assert!(config.verdict_predicate().accepts("ok, looks complete"));
        assert_eq!(config.diagram.header, "graph TD");
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_stage_section_keeps_stage_defaults() {
        let config = ServiceConfig::from_toml_str("[stages.audit]\ntemperature = 0.0\n").unwrap();
        assert_eq!(config.stage(Stage::Audit), StageSettings::new(0.0, 700));

        let config =
            ServiceConfig::from_toml_str("[stages.correction]\nmax_tokens = 3000\n").unwrap();
        assert_eq!(config.stage(Stage::Correction), StageSettings::new(0.65, 3000));
        assert_eq!(config.stage(Stage::Synthesis), StageSettings::new(0.7, 6000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("BAYES_TEST_LLM_ENDPOINT", "https://llm.internal.example/v1");

        let toml_content = r#"
[llm]
endpoint = "${BAYES_TEST_LLM_ENDPOINT}"
api_key = "${BAYES_TEST_UNSET_VARIABLE}"
"#;

        let config = ServiceConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.llm.endpoint, "https://llm.internal.example/v1");
        assert_eq!(config.llm.api_key, "${BAYES_TEST_UNSET_VARIABLE}");

        std::env::remove_var("BAYES_TEST_LLM_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = ServiceConfig::from_toml_str("[llm]\nendpoint = \"invalid-url\"\n").unwrap();
        assert!(bad_endpoint.validate().is_err());

        let bad_temperature =
            ServiceConfig::from_toml_str("[stages.synthesis]\ntemperature = 3.5\nmax_tokens = 10\n")
                .unwrap();
        let err = bad_temperature.validate().unwrap_err();
        assert!(err.to_string().contains("stages.synthesis.temperature"));

        let bad_tokens =
            ServiceConfig::from_toml_str("[stages.diagram]\ntemperature = 0.3\nmax_tokens = 0\n")
                .unwrap();
        assert!(bad_tokens.validate().is_err());

        let empty_header = ServiceConfig::from_toml_str("[diagram]\nheader = \"  \"\n").unwrap();
        assert!(empty_header.validate().is_err());

        let bad_bind = ServiceConfig::from_toml_str("[server]\nbind_address = \"nowhere\"\n").unwrap();
        assert!(bad_bind.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ServiceConfig::from_toml_str("[llm\nmodel = ").unwrap_err();
        assert!(matches!(err, ServiceError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[llm]
model = "gpt-4o-mini"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = ServiceConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }
}
