pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::catalog::Catalog;
#[cfg(feature = "cli")]
use crate::domain::model::{ProposalRequest, Selection};
#[cfg(feature = "cli")]
use crate::utils::error::{ProposalError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const MIN_DISCOUNT: f64 = 1.0;
pub const MAX_DISCOUNT: f64 = 12.0;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "proposal-gen")]
#[command(about = "Generate a sales proposal from a kit dataset and a .docx template")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Kit dataset (CSV), overrides the configured path
    #[arg(long)]
    pub dataset: Option<String>,

    /// Proposal template (.docx), overrides the configured path
    #[arg(long)]
    pub template: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long, default_value = "")]
    pub client_name: String,

    /// Distance from the store in km
    #[arg(long, default_value_t = 0.0)]
    pub distance: f64,

    /// Discount percentage (1-12)
    #[arg(long, default_value_t = 5.0)]
    pub discount: f64,

    /// Part of the kit description; the first match is used
    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long, default_value_t = 1)]
    pub quantity: u32,

    /// Floor plan image (png/jpg/jpeg), at most two are inserted
    #[arg(long = "plan")]
    pub plans: Vec<String>,

    /// Print the kits matching --search and exit
    #[arg(long)]
    pub list_kits: bool,

    /// Show the computed values without writing a document
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML（若有指定）並套用命令列覆蓋設定
    pub fn resolve_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(dataset) = &self.dataset {
            config.paths.dataset = dataset.clone();
            tracing::info!("🔧 Dataset overridden to: {}", dataset);
        }
        if let Some(template) = &self.template {
            config.paths.template = template.clone();
            tracing::info!("🔧 Template overridden to: {}", template);
        }
        if let Some(output_dir) = &self.output_dir {
            config.paths.output_dir = output_dir.clone();
            tracing::info!("🔧 Output directory overridden to: {}", output_dir);
        }

        Ok(config)
    }

    /// 依搜尋字串選出套件，組成單一選擇的請求
    pub fn build_request(&self, catalog: &Catalog) -> Result<ProposalRequest> {
        let matches = catalog.search(&self.search);
        let kit = matches.first().ok_or_else(|| ProposalError::ValidationError {
            message: format!("Nenhum modelo encontrado para '{}'. Ajuste a busca.", self.search),
        })?;

        if matches.len() > 1 {
            tracing::info!(
                "🔎 {} kits match '{}', using '{}'",
                matches.len(),
                self.search,
                kit.description
            );
        }

        Ok(ProposalRequest {
            client_name: self.client_name.clone(),
            selections: vec![Selection::new(kit.description.clone(), self.quantity)],
            distance_km: self.distance,
            discount_percent: self.discount,
            plan_images: self.plans.clone(),
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if !self.list_kits {
            validation::validate_non_empty_string("client_name", &self.client_name)?;
        }
        validation::validate_range("distance", self.distance, 0.0, f64::MAX)?;
        validation::validate_range("discount", self.discount, MIN_DISCOUNT, MAX_DISCOUNT)?;
        validation::validate_positive_number("quantity", self.quantity, 1)?;
        validation::validate_file_extensions("plan", &self.plans, &IMAGE_EXTENSIONS)?;

        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::model::KitRecord;

    fn catalog() -> Catalog {
        let kit = |code: &str, description: &str| KitRecord {
            code: code.to_string(),
            description: description.to_string(),
            unit_weight: 1000.0,
            cash_price: 50000.0,
            area: "50,0".to_string(),
            link: String::new(),
        };
        Catalog::new(vec![kit("K1", "Casa Aurora 2Q"), kit("K2", "Casa Aurora 3Q")])
    }

    #[test]
    fn test_parse_flags() {
        let config = CliConfig::parse_from([
            "proposal-gen",
            "--client-name",
            "Ana Souza",
            "--distance",
            "320",
            "--discount",
            "8",
            "--search",
            "aurora",
            "--quantity",
            "2",
            "--plan",
            "planta1.png",
            "--plan",
            "planta2.jpg",
        ]);

        assert_eq!(config.client_name, "Ana Souza");
        assert_eq!(config.distance, 320.0);
        assert_eq!(config.discount, 8.0);
        assert_eq!(config.plans, vec!["planta1.png", "planta2.jpg"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_request_uses_first_match() {
        let config = CliConfig::parse_from(["proposal-gen", "--client-name", "Ana", "--search", "AURORA", "--quantity", "3"]);
        let request = config.build_request(&catalog()).unwrap();

        assert_eq!(request.selections, vec![Selection::new("Casa Aurora 2Q", 3)]);
        assert_eq!(request.discount_percent, 5.0);
    }

    #[test]
    fn test_build_request_without_match_is_validation_error() {
        let config = CliConfig::parse_from(["proposal-gen", "--client-name", "Ana", "--search", "chalé"]);
        let err = config.build_request(&catalog()).unwrap_err();
        assert!(matches!(err, ProposalError::ValidationError { .. }));
    }

    #[test]
    fn test_validation_rules() {
        let missing_name = CliConfig::parse_from(["proposal-gen"]);
        assert!(missing_name.validate().is_err());

        let listing = CliConfig::parse_from(["proposal-gen", "--list-kits"]);
        assert!(listing.validate().is_ok());

        let discount = CliConfig::parse_from(["proposal-gen", "--client-name", "Ana", "--discount", "15"]);
        assert!(discount.validate().is_err());

        let quantity = CliConfig::parse_from(["proposal-gen", "--client-name", "Ana", "--quantity", "0"]);
        assert!(quantity.validate().is_err());

        let plan = CliConfig::parse_from(["proposal-gen", "--client-name", "Ana", "--plan", "planta.pdf"]);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let config = CliConfig::parse_from([
            "proposal-gen",
            "--template",
            "outro.docx",
            "--output-dir",
            "/tmp/saida",
        ]);
        let resolved = config.resolve_config().unwrap();

        assert_eq!(resolved.paths.dataset, toml_config::DEFAULT_DATASET);
        assert_eq!(resolved.paths.template, "outro.docx");
        assert_eq!(resolved.paths.output_dir, "/tmp/saida");
    }
}
