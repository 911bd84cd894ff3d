use crate::core::ConfigProvider;
use crate::utils::error::{ProposalError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_DATASET: &str = "kits.csv";
pub const DEFAULT_TEMPLATE: &str = "modelo_novo.docx";
pub const DEFAULT_OUTPUT_DIR: &str = "propostas_geradas";

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    pub dataset: Option<DatasetConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub dataset: String,
    pub template: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                dataset: DEFAULT_DATASET.to_string(),
                template: DEFAULT_TEMPLATE.to_string(),
                output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            },
            dataset: None,
            monitoring: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProposalError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ProposalError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數（例如 `${PROPOSTAS_DIR}`），未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_path("paths.dataset", &self.paths.dataset)?;
        crate::utils::validation::validate_path("paths.template", &self.paths.template)?;
        crate::utils::validation::validate_path("paths.output_dir", &self.paths.output_dir)?;
        crate::utils::validation::validate_file_extensions(
            "paths.template",
            std::slice::from_ref(&self.paths.template),
            &["docx"],
        )?;
        self.delimiter()?;

        Ok(())
    }

    /// 資料集分隔字元，必須是單一 ASCII 字元
    pub fn delimiter(&self) -> Result<u8> {
        let Some(raw) = self.dataset.as_ref().and_then(|d| d.delimiter.as_deref()) else {
            return Ok(b',');
        };

        match raw.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ProposalError::InvalidConfigValueError {
                field: "dataset.delimiter".to_string(),
                value: raw.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            }),
        }
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn dataset_path(&self) -> &str {
        &self.paths.dataset
    }

    fn template_path(&self) -> &str {
        &self.paths.template
    }

    fn output_dir(&self) -> &str {
        &self.paths.output_dir
    }

    fn dataset_delimiter(&self) -> u8 {
        // validate() 已檢查過，這裡退回預設值
        self.delimiter().unwrap_or(b',')
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
