use crate::core::catalog::Catalog;
use crate::core::{pricing, substitution};
use crate::core::{ConfigProvider, Pipeline, ProposalInputs, RenderedProposal, Storage};
use crate::document::{DocxPackage, EMU_PER_INCH};
use crate::domain::model::{PlanImageFile, ProposalRequest};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::path::Path;

/// 只插入前兩張平面圖
pub const MAX_PLAN_IMAGES: usize = 2;
pub const PLAN_IMAGE_WIDTH_EMU: i64 = 5 * EMU_PER_INCH;

pub struct ProposalPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) request: ProposalRequest,
    pub(crate) date: NaiveDate,
}

impl<S: Storage, C: ConfigProvider> ProposalPipeline<S, C> {
    pub fn new(storage: S, config: C, request: ProposalRequest) -> Self {
        Self {
            storage,
            config,
            request,
            date: chrono::Local::now().date_naive(),
        }
    }

    /// 固定提案日期（`{{data_atual}}`）
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn output_path(&self) -> String {
        Path::new(self.config.output_dir())
            .join(output_file_name(&self.request.client_name))
            .to_string_lossy()
            .into_owned()
    }
}

/// 輸出檔名由客戶名稱決定，空白換成底線
pub fn output_file_name(client_name: &str) -> String {
    format!("Proposta_{}.docx", client_name.replace(' ', "_"))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ProposalPipeline<S, C> {
    async fn extract(&self) -> Result<ProposalInputs> {
        tracing::debug!("Reading dataset from: {}", self.config.dataset_path());
        let dataset = self.storage.read_file(self.config.dataset_path()).await?;
        let catalog = Catalog::from_csv(&dataset, self.config.dataset_delimiter())?;

        tracing::debug!("Reading template from: {}", self.config.template_path());
        let template_bytes = self.storage.read_file(self.config.template_path()).await?;
        let template = DocxPackage::from_bytes(&template_bytes)?;

        if self.request.plan_images.len() > MAX_PLAN_IMAGES {
            tracing::warn!(
                "⚠️ {} floor plans supplied, only the first {} are used",
                self.request.plan_images.len(),
                MAX_PLAN_IMAGES
            );
        }

        let mut plan_images = Vec::new();
        for path in self.request.plan_images.iter().take(MAX_PLAN_IMAGES) {
            let data = self.storage.read_file(path).await?;
            let file_name = Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            tracing::debug!("Read floor plan '{}' ({} bytes)", file_name, data.len());
            plan_images.push(PlanImageFile { file_name, data });
        }

        Ok(ProposalInputs {
            kits: catalog.into_kits(),
            template,
            plan_images,
        })
    }

    async fn transform(&self, inputs: ProposalInputs) -> Result<RenderedProposal> {
        let catalog = Catalog::new(inputs.kits);
        let summary = pricing::calculate(&catalog, &self.request, self.date);
        tracing::debug!("Pricing summary: {:?}", summary);

        let substitutions = summary.substitutions();
        let mut document = inputs.template;
        let paragraphs_rewritten = substitution::apply_to_package(&mut document, &substitutions)?;

        for image in &inputs.plan_images {
            document.append_picture(&image.file_name, &image.data, PLAN_IMAGE_WIDTH_EMU)?;
        }

        Ok(RenderedProposal {
            document,
            substitutions,
            paragraphs_rewritten,
            images_inserted: inputs.plan_images.len(),
        })
    }

    async fn load(&self, rendered: RenderedProposal) -> Result<String> {
        let output_path = self.output_path();
        let data = rendered.document.to_bytes()?;

        tracing::debug!("Writing proposal ({} bytes) to storage", data.len());
        self.storage.write_file(&output_path, &data).await?;

        tracing::debug!("Proposal saved successfully");
        Ok(output_path)
    }
}
