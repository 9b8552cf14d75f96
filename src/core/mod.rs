pub mod documents;
pub mod engine;
pub mod exporter;
pub mod fetcher;
pub mod pipeline;
pub mod query;

pub use crate::domain::model::{
    ExportArtifacts, PageRequest, Record, RenderedExport, ResultSet, SearchQuery,
};
pub use crate::domain::ports::{ConfigProvider, NoticeSource, Pipeline, Storage};
pub use crate::utils::error::Result;
