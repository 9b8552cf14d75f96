use crate::core::{ExportArtifacts, Pipeline, ResultSet};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Outcome of one search run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: ResultSet,
    pub artifacts: ExportArtifacts,
}

pub struct SearchEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> SearchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting notice search...");
        self.monitor.log_stats("Start");

        // Extract
        let result = self.pipeline.extract().await?;
        tracing::info!(
            "Fetched {} notices from {} page(s)",
            result.len(),
            result.pages_fetched
        );
        self.monitor.log_stats("Fetch");

        // Transform
        let rendered = self.pipeline.transform(&result).await?;
        tracing::debug!(
            "Rendered spreadsheet ({} bytes) and JSON ({} bytes)",
            rendered.spreadsheet.len(),
            rendered.json.len()
        );
        self.monitor.log_stats("Render");

        // Load
        let artifacts = self.pipeline.load(rendered).await?;
        tracing::info!("📁 Spreadsheet: {}", artifacts.spreadsheet_path);
        tracing::info!("📁 JSON: {}", artifacts.json_path);
        self.monitor.log_final_stats();

        Ok(RunReport { result, artifacts })
    }
}
