use crate::config::settings::Settings;
use crate::core::query::ExpertQuery;
use crate::domain::model::DocumentKind;
use crate::utils::error::{Result, TedError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

/// Saved search profile, e.g. `ted-search.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub api: ApiSection,
    pub search: SearchSection,
    pub export: ExportSection,
    pub documents: DocumentsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub health_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub query: Option<String>,
    /// Used when `query` is absent.
    pub criteria: Option<ExpertQuery>,
    pub fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub max_pages: Option<u32>,
    /// Ignore `max_pages` and page until the results run out.
    pub all_pages: Option<bool>,
    pub start_page: Option<u32>,
    pub max_results: Option<usize>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub output_path: Option<String>,
    pub name: Option<String>,
    pub timestamp: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsSection {
    pub kinds: Option<Vec<DocumentKind>>,
    pub language: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TedError::ConfigError {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TedError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TED_BASE_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Overlays every value present in the file onto `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        let api = &self.api;
        if let Some(base_url) = &api.base_url {
            settings.api.base_url = base_url.clone();
        }
        if let Some(timeout) = api.timeout_seconds {
            settings.api.timeout_seconds = timeout;
        }
        if let Some(health_path) = &api.health_path {
            settings.api.health_path = health_path.clone();
        }

        let search = &self.search;
        if let Some(query) = search
            .query
            .clone()
            .or_else(|| search.criteria.as_ref().and_then(ExpertQuery::build))
        {
            settings.search.query = query;
        }
        if let Some(fields) = &search.fields {
            settings.search.fields = fields.clone();
        }
        if let Some(limit) = search.limit {
            settings.search.limit = limit;
        }
        if let Some(max_pages) = search.max_pages {
            settings.search.max_pages = Some(max_pages);
        }
        if search.all_pages.unwrap_or(false) {
            settings.search.max_pages = None;
        }
        if let Some(start_page) = search.start_page {
            settings.search.start_page = start_page;
        }
        if let Some(max_results) = search.max_results {
            settings.search.max_results = Some(max_results);
        }
        if let Some(language) = &search.language {
            settings.search.language = Some(language.clone());
        }

        let export = &self.export;
        if let Some(output_path) = &export.output_path {
            settings.export.output_path = output_path.clone();
        }
        if let Some(name) = &export.name {
            settings.export.name = Some(name.clone());
        }
        if let Some(timestamp) = export.timestamp {
            settings.export.timestamp = timestamp;
        }

        if let Some(kinds) = &self.documents.kinds {
            settings.documents.kinds = kinds.clone();
        }
        if let Some(language) = &self.documents.language {
            settings.documents.language = language.clone();
        }
    }

    pub fn into_settings(self) -> Settings {
        let mut settings = Settings::default();
        self.apply_to(&mut settings);
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_profile() {
        let toml_content = r#"
[api]
base_url = "http://localhost:8080"
timeout_seconds = 10

[search]
query = 'FT="hamburg"'
fields = ["publication-number", "notice-title"]
limit = 100
max_pages = 5
language = "DEU"

[export]
output_path = "./exports"
name = "hamburg"
timestamp = true

[documents]
kinds = ["xml", "pdf"]
language = "ENG"
"#;

        let settings = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_settings();

        assert_eq!(settings.api.base_url, "http://localhost:8080");
        assert_eq!(settings.api.timeout_seconds, 10);
        assert_eq!(settings.api.health_path, "/");
        assert_eq!(settings.search.query, "FT=\"hamburg\"");
        assert_eq!(settings.search.limit, 100);
        assert_eq!(settings.search.max_pages, Some(5));
        assert_eq!(settings.search.language.as_deref(), Some("DEU"));
        assert_eq!(settings.export.name.as_deref(), Some("hamburg"));
        assert!(settings.export.timestamp);
        assert_eq!(
            settings.documents.kinds,
            vec![DocumentKind::Xml, DocumentKind::Pdf]
        );
        assert_eq!(settings.documents.language, "ENG");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let settings = TomlConfig::from_toml_str("").unwrap().into_settings();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_criteria_compose_query_and_all_pages() {
        let toml_content = r#"
[search]
all_pages = true

[search.criteria]
cpv = "45000000"
published_from = "2025-01-01"
"#;

        let settings = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_settings();

        assert_eq!(settings.search.query, "PC=\"45000000\" AND PD>=20250101");
        assert_eq!(settings.search.max_pages, None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TED_SEARCH_TEST_BASE_URL", "https://ted.test");

        let toml_content = r#"
[api]
base_url = "${TED_SEARCH_TEST_BASE_URL}"
health_path = "${TED_SEARCH_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("https://ted.test"));
        assert_eq!(
            config.api.health_path.as_deref(),
            Some("${TED_SEARCH_UNSET_VARIABLE}")
        );

        std::env::remove_var("TED_SEARCH_TEST_BASE_URL");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[search\nlimit = ").unwrap_err();
        assert!(matches!(err, TedError::ConfigError { .. }));
    }

    #[test]
    fn test_unknown_document_kind_is_rejected() {
        let err = TomlConfig::from_toml_str("[documents]\nkinds = [\"docx\"]").unwrap_err();
        assert!(matches!(err, TedError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[search]\nquery = 'FT=\"kassel\"'\nlimit = 20\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.search.limit, Some(20));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = TomlConfig::from_file("/definitely/not/here/ted-search.toml").unwrap_err();
        assert!(matches!(err, TedError::ConfigError { .. }));
    }
}
