use crate::domain::model::{ProposalInputs, RenderedProposal};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn dataset_path(&self) -> &str;
    fn template_path(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn dataset_delimiter(&self) -> u8;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ProposalInputs>;
    async fn transform(&self, inputs: ProposalInputs) -> Result<RenderedProposal>;
    async fn load(&self, rendered: RenderedProposal) -> Result<String>;
}
