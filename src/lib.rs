pub mod app;
pub mod config;
pub mod core;
pub mod document;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};

pub use crate::app::pipelines::proposal_pipeline::ProposalPipeline;
pub use crate::core::{catalog::Catalog, etl::ProposalEngine};
pub use crate::domain::model::{ProposalRequest, Selection};
pub use crate::utils::error::{ProposalError, Result};
