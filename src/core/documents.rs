use crate::domain::model::{DocumentKind, DownloadReport, Record};
use crate::domain::ports::Storage;
use crate::utils::error::{RequestTarget, Result, TedError};
use reqwest::Client;
use serde_json::Value;

/// Language key TED uses for the multilingual XML rendition.
const XML_LANGUAGE: &str = "MUL";

/// Link to the `kind` rendition of a notice, if the search returned one.
pub fn document_url<'a>(record: &'a Record, kind: DocumentKind, language: &str) -> Option<&'a str> {
    let path = match kind {
        DocumentKind::Xml => ["links", "xml", XML_LANGUAGE],
        DocumentKind::Pdf => ["links", "pdf", language],
    };
    match record.get_path(&path)? {
        Value::String(url) if !url.is_empty() => Some(url.as_str()),
        _ => None,
    }
}

/// Saves notice renditions as `<folder>/<ext>/<publication-number>.<ext>`.
///
/// A document that cannot be fetched is recorded in the report and the next
/// one is tried; a storage failure stops the run.
pub struct DocumentDownloader<S: Storage> {
    client: Client,
    storage: S,
    language: String,
}

impl<S: Storage> DocumentDownloader<S> {
    pub fn new(client: Client, storage: S, language: impl Into<String>) -> Self {
        Self {
            client,
            storage,
            language: language.into(),
        }
    }

    pub async fn download(
        &self,
        records: &[Record],
        kinds: &[DocumentKind],
        folder: &str,
    ) -> Result<DownloadReport> {
        let mut report = DownloadReport::default();

        for kind in kinds {
            for record in records {
                let (Some(number), Some(url)) = (
                    record.publication_number(),
                    document_url(record, *kind, &self.language),
                ) else {
                    report.skipped += 1;
                    continue;
                };

                match self.fetch(url).await {
                    Ok(bytes) => {
                        let path = format!(
                            "{}/{}/{}.{}",
                            folder,
                            kind.extension(),
                            file_safe(number),
                            kind.extension()
                        );
                        self.storage.write_file(&path, &bytes).await?;
                        report.saved.push(self.storage.display_path(&path));
                    }
                    Err(e) => {
                        tracing::warn!(
                            "⚠️ Failed to download {} for {}: {}",
                            kind.extension(),
                            number,
                            e
                        );
                        report.failed.push((number.to_string(), e.to_string()));
                    }
                }
            }
        }

        tracing::info!(
            "📥 Documents: {} saved, {} skipped, {} failed",
            report.saved.len(),
            report.skipped,
            report.failed.len()
        );
        Ok(report)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let target = RequestTarget::Document(url.to_string());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| TedError::TransportError {
                target: target.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TedError::ApiError {
                target,
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| TedError::TransportError { target, source })?;
        Ok(bytes.to_vec())
    }
}

fn file_safe(number: &str) -> String {
    number
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_document_url_lookup() {
        let rec = record(json!({
            "links": {
                "xml": {"MUL": "https://ted/1.xml"},
                "pdf": {"DEU": "https://ted/1-de.pdf", "ENG": ""}
            }
        }));

        assert_eq!(document_url(&rec, DocumentKind::Xml, "DEU"), Some("https://ted/1.xml"));
        assert_eq!(document_url(&rec, DocumentKind::Pdf, "DEU"), Some("https://ted/1-de.pdf"));
        assert_eq!(document_url(&rec, DocumentKind::Pdf, "ENG"), None);
        assert_eq!(document_url(&rec, DocumentKind::Pdf, "FRA"), None);
    }

    #[test]
    fn test_file_safe() {
        assert_eq!(file_safe("123/2025:x"), "123_2025_x");
    }

    #[tokio::test]
    async fn test_download_saves_skips_and_reports_failures() {
        let server = MockServer::start();
        let ok_mock = server.mock(|when, then| {
            when.method(GET).path("/1.xml");
            then.status(200).body("<notice/>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/2.xml");
            then.status(404);
        });

        let records = vec![
            record(json!({
                "publication-number": "1-2025",
                "links": {"xml": {"MUL": server.url("/1.xml")}}
            })),
            record(json!({
                "publication-number": "2-2025",
                "links": {"xml": {"MUL": server.url("/2.xml")}}
            })),
            record(json!({"publication-number": "3-2025"})),
            record(json!({"links": {"xml": {"MUL": server.url("/1.xml")}}})),
        ];

        let temp_dir = TempDir::new().unwrap();
        let downloader = DocumentDownloader::new(
            Client::new(),
            LocalStorage::new(temp_dir.path().to_str().unwrap()),
            "DEU",
        );

        let report = downloader
            .download(&records, &[DocumentKind::Xml], "kassel")
            .await
            .unwrap();

        ok_mock.assert();
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "2-2025");

        let saved = std::fs::read_to_string(temp_dir.path().join("kassel/xml/1-2025.xml")).unwrap();
        assert_eq!(saved, "<notice/>");
    }
}
