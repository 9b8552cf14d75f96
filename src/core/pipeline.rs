use crate::core::exporter::Exporter;
use crate::core::fetcher::fetch_all;
use crate::core::{ExportArtifacts, NoticeSource, Pipeline, RenderedExport, ResultSet, Storage};
use crate::domain::model::SearchQuery;
use crate::utils::error::Result;

/// Search → flatten → write, for one query and one base name.
pub struct NoticePipeline<N: NoticeSource, S: Storage> {
    source: N,
    exporter: Exporter<S>,
    query: SearchQuery,
    base_name: String,
}

impl<N: NoticeSource, S: Storage> NoticePipeline<N, S> {
    pub fn new(source: N, storage: S, query: SearchQuery, base_name: impl Into<String>) -> Self {
        Self {
            source,
            exporter: Exporter::new(storage),
            query,
            base_name: base_name.into(),
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }
}

#[async_trait::async_trait]
impl<N: NoticeSource, S: Storage> Pipeline for NoticePipeline<N, S> {
    async fn extract(&self) -> Result<ResultSet> {
        tracing::debug!("Searching: {}", self.query.query);
        fetch_all(&self.source, &self.query).await
    }

    async fn transform(&self, data: &ResultSet) -> Result<RenderedExport> {
        self.exporter.render(&data.records, &self.base_name)
    }

    async fn load(&self, rendered: RenderedExport) -> Result<ExportArtifacts> {
        self.exporter.write(rendered).await
    }
}
