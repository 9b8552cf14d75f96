use crate::adapters::http::{DEFAULT_BASE_URL, DEFAULT_HEALTH_PATH, DEFAULT_TIMEOUT_SECS};
use crate::core::exporter::{default_base_name, timestamped};
use crate::domain::model::{DocumentKind, SearchQuery, MAX_PAGE_SIZE};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_stem, validate_language_code, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_url, Validate,
};
use chrono::{DateTime, Local};
use std::time::Duration;

/// Example search run when nothing else is configured.
pub const DEFAULT_QUERY: &str = "FT=\"kassel\"";
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &["publication-number", "publication-date"];
pub const DEFAULT_LIMIT: u32 = 50;
pub const DEFAULT_MAX_PAGES: u32 = 3;
pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_DOCUMENT_LANGUAGE: &str = "DEU";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub health_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub output_path: String,
    /// Derived from the query when unset.
    pub name: Option<String>,
    pub timestamp: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            name: None,
            timestamp: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSettings {
    pub kinds: Vec<DocumentKind>,
    pub language: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            language: DEFAULT_DOCUMENT_LANGUAGE.to_string(),
        }
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api: ApiSettings,
    pub search: SearchQuery,
    pub export: ExportSettings,
    pub documents: DocumentSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let fields = DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect();
        Self {
            api: ApiSettings::default(),
            search: SearchQuery::new(DEFAULT_QUERY, fields)
                .with_limit(DEFAULT_LIMIT)
                .with_max_pages(DEFAULT_MAX_PAGES),
            export: ExportSettings::default(),
            documents: DocumentSettings::default(),
        }
    }
}

impl Settings {
    /// File base name for the artifacts of this run.
    pub fn base_name(&self, now: DateTime<Local>) -> String {
        let base = match &self.export.name {
            Some(name) => name.clone(),
            None => default_base_name(&self.search.query),
        };
        if self.export.timestamp {
            timestamped(&base, now)
        } else {
            base
        }
    }
}

impl ConfigProvider for Settings {
    fn base_url(&self) -> &str {
        &self.api.base_url
    }

    fn health_path(&self) -> &str {
        &self.api.health_path
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 600)?;

        validate_non_empty_string("search.query", &self.search.query)?;
        validate_range("search.limit", self.search.limit, 1, MAX_PAGE_SIZE)?;
        validate_range("search.start_page", self.search.start_page, 1, u32::MAX)?;
        if let Some(max_pages) = self.search.max_pages {
            validate_range("search.max_pages", max_pages, 1, u32::MAX)?;
        }
        if let Some(max_results) = self.search.max_results {
            validate_positive_number("search.max_results", max_results, 1)?;
        }
        if let Some(language) = &self.search.language {
            validate_language_code("search.language", language)?;
        }

        validate_path("export.output_path", &self.export.output_path)?;
        if let Some(name) = &self.export.name {
            validate_file_stem("export.name", name)?;
        }

        validate_language_code("documents.language", &self.documents.language)?;
        Ok(())
    }
}
