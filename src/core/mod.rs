pub mod catalog;
pub mod etl;
pub mod format;
pub mod pricing;
pub mod substitution;

pub use crate::domain::model::{ProposalInputs, RenderedProposal, Substitutions};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
