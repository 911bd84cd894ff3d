use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct ProposalEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ProposalEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 執行一次完整的提案產生，回傳輸出檔路徑
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting proposal generation...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("Loading dataset, template and floor plans...");
        let inputs = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} kits and {} floor plans",
            inputs.kits.len(),
            inputs.plan_images.len()
        );
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("Filling template...");
        let rendered = self.pipeline.transform(inputs).await?;
        tracing::info!(
            "Applied {} substitutions to {} paragraphs, inserted {} images",
            rendered.substitutions.len(),
            rendered.paragraphs_rewritten,
            rendered.images_inserted
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("Saving proposal...");
        let output_path = self.pipeline.load(rendered).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
