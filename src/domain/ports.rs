use crate::domain::model::{ExportArtifacts, PageRequest, RenderedExport, ResultSet, SearchPage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Where `path` ends up, for messages and reports.
    fn display_path(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn health_path(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn output_path(&self) -> &str;
}

/// Anything that can answer one page of a notice search.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ResultSet>;
    async fn transform(&self, data: &ResultSet) -> Result<RenderedExport>;
    async fn load(&self, rendered: RenderedExport) -> Result<ExportArtifacts>;
}
