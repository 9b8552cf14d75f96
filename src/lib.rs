pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{http::TedClient, storage::LocalStorage};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{Settings, TomlConfig};

pub use self::core::{
    documents::DocumentDownloader, engine::SearchEngine, exporter::Exporter,
    fetcher::{count_matches, fetch_all}, pipeline::NoticePipeline, query::ExpertQuery,
};
pub use domain::model::{Record, ResultSet, SearchQuery};
pub use utils::error::{Result, TedError};
