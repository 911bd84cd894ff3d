use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProposalError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Dataset is missing required column '{column}'")]
    MissingColumnError { column: String },

    #[error("Template error: {message}")]
    TemplateError { message: String },

    #[error("Image error in '{path}': {message}")]
    ImageError { path: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Template,
    Storage,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 輸入或範本問題，修正後重跑即可
    High,
    /// 檔案系統層級的失敗
    Critical,
}

impl ProposalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProposalError::ConfigValidationError { .. }
            | ProposalError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ProposalError::CsvError(_)
            | ProposalError::MissingColumnError { .. }
            | ProposalError::ImageError { .. }
            | ProposalError::ValidationError { .. } => ErrorCategory::Input,
            ProposalError::ZipError(_) | ProposalError::TemplateError { .. } => {
                ErrorCategory::Template
            }
            ProposalError::IoError(_) => ErrorCategory::Storage,
            ProposalError::SerializationError(_) => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration
            | ErrorCategory::Input
            | ErrorCategory::Template
            | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ProposalError::MissingColumnError { column } => format!(
                "Add a '{}' column to the kit dataset header row",
                column
            ),
            ProposalError::CsvError(_) => {
                "Check the dataset delimiter and that PESO UND / A VISTA are numeric".to_string()
            }
            ProposalError::ZipError(_) | ProposalError::TemplateError { .. } => {
                "Make sure the template is a valid .docx file saved by a word processor"
                    .to_string()
            }
            ProposalError::ImageError { .. } => {
                "Use PNG or JPEG floor plans that open in an image viewer".to_string()
            }
            ProposalError::IoError(_) => {
                "Check that the input files exist and the output directory is writable"
                    .to_string()
            }
            ProposalError::ConfigValidationError { .. }
            | ProposalError::InvalidConfigValueError { .. } => {
                "Review the command-line flags and the TOML configuration file".to_string()
            }
            ProposalError::ValidationError { .. } => {
                "Preencha o nome do cliente e selecione o modelo.".to_string()
            }
            ProposalError::SerializationError(_) => {
                "Run again with --verbose and inspect the log".to_string()
            }
        }
    }

    /// 依嚴重程度決定的程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        format!("Erro ao gerar proposta: {}", self)
    }
}

pub type Result<T> = std::result::Result<T, ProposalError>;
