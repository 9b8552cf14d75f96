use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// TED caps the page size of `/v3/notices/search`.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Used when the caller asks for no fields at all.
pub const DEFAULT_FIELDS: &[&str] = &["publication-date"];

/// One notice as returned by the API.
///
/// The field set is chosen per query, so the record is an open key/value map.
/// Keys keep the order they arrived in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Follows a path of nested object keys, e.g. `["links", "pdf", "DEU"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.data.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    /// `publication-number` as a string, used to name downloaded documents.
    pub fn publication_number(&self) -> Option<&str> {
        self.get("publication-number").and_then(Value::as_str)
    }

    /// Whether the notice links a PDF rendition in `language`.
    pub fn has_pdf_in(&self, language: &str) -> bool {
        matches!(
            self.get_path(&["links", "pdf", language]),
            Some(Value::String(url)) if !url.is_empty()
        )
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Expert-search query, passed to the API verbatim.
    pub query: String,
    pub fields: Vec<String>,
    /// Page size sent as `limit`.
    pub limit: u32,
    /// `None` pages until the API runs out of notices.
    pub max_pages: Option<u32>,
    pub start_page: u32,
    /// Hard cap on the number of records kept.
    pub max_results: Option<usize>,
    /// Keep only notices with a PDF in this language.
    pub language: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            query: query.into(),
            fields,
            limit: 50,
            max_pages: None,
            start_page: 1,
            max_results: None,
            language: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_start_page(mut self, start_page: u32) -> Self {
        self.start_page = start_page;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Fields as sent on the wire; never empty.
    pub fn request_fields(&self) -> Vec<String> {
        if self.fields.is_empty() {
            DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            self.fields.clone()
        }
    }

    /// Last page number this query may request, if bounded.
    pub fn last_page(&self) -> Option<u32> {
        self.max_pages
            .map(|max| self.start_page.saturating_add(max.saturating_sub(1)))
    }
}

/// Body of one `POST /v3/notices/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRequest {
    pub query: String,
    pub fields: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

/// One page of the search response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchPage {
    #[serde(default, alias = "results")]
    pub notices: Vec<Record>,
    #[serde(default, rename = "totalNoticeCount", alias = "totalNotices")]
    pub total_notice_count: Option<u64>,
}

/// Notices accumulated across pages, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub records: Vec<Record>,
    pub pages_fetched: u32,
    pub total_notice_count: Option<u64>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reachability and version information reported by the health endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiStatus {
    pub endpoint: String,
    pub latest_supported_version: Option<String>,
    pub metadata: Value,
}

/// Both artifacts rendered in memory, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedExport {
    pub base_name: String,
    pub record_count: usize,
    pub spreadsheet: Vec<u8>,
    pub json: Vec<u8>,
}

/// Paths of the files written by one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifacts {
    pub spreadsheet_path: String,
    pub json_path: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Xml,
    Pdf,
}

impl DocumentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Xml => "xml",
            DocumentKind::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    pub saved: Vec<String>,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
}
