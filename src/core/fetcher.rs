use crate::domain::model::{PageRequest, ResultSet, SearchQuery};
use crate::domain::ports::NoticeSource;
use crate::utils::error::{Result, TedError};

/// Pages through a search and concatenates the notices in page order.
///
/// Paging stops at the first of: an empty page, a page shorter than
/// `query.limit`, the last page allowed by `max_pages`, the advertised total
/// count being covered, or `max_results` records collected.
///
/// A failed page aborts the whole fetch. Notices already collected from
/// earlier pages are dropped and only the error is returned.
pub async fn fetch_all<S>(source: &S, query: &SearchQuery) -> Result<ResultSet>
where
    S: NoticeSource + ?Sized,
{
    if query.limit == 0 {
        return Err(TedError::InvalidConfigValueError {
            field: "limit".to_string(),
            value: "0".to_string(),
            reason: "Page size must be at least 1".to_string(),
        });
    }
    if query.start_page == 0 {
        return Err(TedError::InvalidConfigValueError {
            field: "start_page".to_string(),
            value: "0".to_string(),
            reason: "Pages are numbered from 1".to_string(),
        });
    }
    if query.max_pages == Some(0) {
        return Err(TedError::InvalidConfigValueError {
            field: "max_pages".to_string(),
            value: "0".to_string(),
            reason: "At least one page must be allowed".to_string(),
        });
    }

    let fields = query.request_fields();
    let last_page = query.last_page();
    let page_size = query.limit as usize;

    let mut result = ResultSet::default();
    let mut page = query.start_page;

    loop {
        if last_page.is_some_and(|last| page > last) {
            tracing::debug!("Reached page limit after page {}", page - 1);
            break;
        }

        let request = PageRequest {
            query: query.query.clone(),
            fields: fields.clone(),
            page,
            limit: query.limit,
        };

        let response = match source.fetch_page(&request).await {
            Ok(response) => response,
            Err(e) => {
                if !result.is_empty() {
                    tracing::warn!(
                        "Discarding {} notices from {} earlier page(s) after page {} failed",
                        result.len(),
                        result.pages_fetched,
                        page
                    );
                }
                return Err(e);
            }
        };

        result.pages_fetched += 1;
        if result.total_notice_count.is_none() {
            if let Some(total) = response.total_notice_count {
                tracing::info!("🔎 API reports {} matching notices", total);
                result.total_notice_count = Some(total);
            }
        }

        let received = response.notices.len();
        let mut notices = response.notices;
        if let Some(language) = query.language.as_deref() {
            notices.retain(|notice| notice.has_pdf_in(language));
        }
        let kept = notices.len();
        result.records.extend(notices);

        tracing::info!(
            "📄 Page {}: {} notices received, {} kept ({} total)",
            page,
            received,
            kept,
            result.len()
        );

        if let Some(max_results) = query.max_results {
            if result.len() >= max_results {
                result.records.truncate(max_results);
                tracing::debug!("Collected the requested {} notices", max_results);
                break;
            }
        }

        // 不足一頁代表已到最後一頁
        if received < page_size {
            break;
        }

        if let Some(total) = result.total_notice_count {
            if u64::from(page) * u64::from(query.limit) >= total {
                break;
            }
        }

        page = match page.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(result)
}

/// Number of notices matching `query`, from a single one-notice request.
///
/// `None` when the API does not advertise a total and the page is not empty.
pub async fn count_matches<S>(source: &S, query: &SearchQuery) -> Result<Option<u64>>
where
    S: NoticeSource + ?Sized,
{
    let request = PageRequest {
        query: query.query.clone(),
        fields: query.request_fields(),
        page: 1,
        limit: 1,
    };
    let response = source.fetch_page(&request).await?;

    let count = match response.total_notice_count {
        Some(total) => Some(total),
        None if response.notices.is_empty() => Some(0),
        None => None,
    };
    tracing::debug!("Count for {}: {:?}", query.query, count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Record, SearchPage};
    use crate::utils::error::RequestTarget;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves `total` numbered notices, optionally failing on one page.
    struct ScriptedSource {
        total: usize,
        advertise_total: bool,
        fail_on: Option<u32>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedSource {
        fn new(total: usize) -> Self {
            Self {
                total,
                advertise_total: false,
                fail_on: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn pages_requested(&self) -> Vec<u32> {
            self.requests.lock().unwrap().iter().map(|r| r.page).collect()
        }
    }

    #[async_trait::async_trait]
    impl NoticeSource for ScriptedSource {
        async fn fetch_page(&self, request: &PageRequest) -> Result<SearchPage> {
            self.requests.lock().unwrap().push(request.clone());

            if self.fail_on == Some(request.page) {
                return Err(TedError::ApiError {
                    target: RequestTarget::Page(request.page),
                    status: Some(500),
                    message: "boom".to_string(),
                });
            }

            let size = request.limit as usize;
            let start = (request.page as usize - 1) * size;
            let end = (start + size).min(self.total);
            let notices = (start.min(end)..end)
                .map(|i| {
                    let mut notice = json!({"publication-number": format!("{}-2025", i)});
                    if i % 2 == 0 {
                        notice["links"] = json!({"pdf": {"DEU": format!("https://ted/{}.pdf", i)}});
                    }
                    serde_json::from_value::<Record>(notice).unwrap()
                })
                .collect();

            Ok(SearchPage {
                notices,
                total_notice_count: self.advertise_total.then_some(self.total as u64),
            })
        }
    }

    fn numbers(result: &ResultSet) -> Vec<String> {
        result
            .records
            .iter()
            .map(|r| r.publication_number().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_collects_every_record_in_order() {
        for (limit, total) in [(1u32, 5usize), (3, 7), (5, 5), (10, 3), (4, 0), (50, 112)] {
            let source = ScriptedSource::new(total);
            let query = SearchQuery::new("FT=\"x\"", vec![])
                .with_limit(limit)
                .with_max_pages(total as u32 / limit + 2);

            let result = fetch_all(&source, &query).await.unwrap();

            let expected: Vec<String> = (0..total).map(|i| format!("{}-2025", i)).collect();
            assert_eq!(numbers(&result), expected, "limit={} total={}", limit, total);
        }
    }

    #[tokio::test]
    async fn test_stops_after_short_page() {
        let source = ScriptedSource::new(112);
        let query = SearchQuery::new("FT=\"kassel\"", vec![])
            .with_limit(50)
            .with_max_pages(10);

        let result = fetch_all(&source, &query).await.unwrap();

        assert_eq!(result.len(), 112);
        assert_eq!(result.pages_fetched, 3);
        assert_eq!(source.pages_requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_one_empty_page() {
        let source = ScriptedSource::new(10);
        let query = SearchQuery::new("q", vec![]).with_limit(5);

        let result = fetch_all(&source, &query).await.unwrap();

        assert_eq!(result.len(), 10);
        assert_eq!(source.pages_requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_advertised_total_avoids_extra_request() {
        let mut source = ScriptedSource::new(10);
        source.advertise_total = true;
        let query = SearchQuery::new("q", vec![]).with_limit(5);

        let result = fetch_all(&source, &query).await.unwrap();

        assert_eq!(result.len(), 10);
        assert_eq!(result.total_notice_count, Some(10));
        assert_eq!(source.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_respects_max_pages() {
        let source = ScriptedSource::new(100);
        let query = SearchQuery::new("q", vec![]).with_limit(10).with_max_pages(2);

        let result = fetch_all(&source, &query).await.unwrap();

        assert_eq!(result.len(), 20);
        assert_eq!(source.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_start_page_offsets_window() {
        let source = ScriptedSource::new(100);
        let query = SearchQuery::new("q", vec![])
            .with_limit(10)
            .with_start_page(3)
            .with_max_pages(2);

        let result = fetch_all(&source, &query).await.unwrap();

        assert_eq!(source.pages_requested(), vec![3, 4]);
        assert_eq!(numbers(&result).first().map(String::as_str), Some("20-2025"));
    }

    #[tokio::test]
    async fn test_max_results_truncates() {
        let source = ScriptedSource::new(100);
        let query = SearchQuery::new("q", vec![])
            .with_limit(10)
            .with_max_results(15);

        let result = fetch_all(&source, &query).await.unwrap();

        assert_eq!(result.len(), 15);
        assert_eq!(source.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_language_filter_keeps_paging_on_full_pages() {
        let source = ScriptedSource::new(20);
        let query = SearchQuery::new("q", vec![])
            .with_limit(10)
            .with_max_pages(5)
            .with_language("DEU");

        let result = fetch_all(&source, &query).await.unwrap();

        // 只有偶數編號的公告有德文 PDF
        assert_eq!(result.len(), 10);
        assert!(result.records.iter().all(|r| r.has_pdf_in("DEU")));
        assert_eq!(source.pages_requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_page_discards_earlier_pages() {
        let mut source = ScriptedSource::new(100);
        source.fail_on = Some(2);
        let query = SearchQuery::new("q", vec![]).with_limit(10).with_max_pages(5);

        let err = fetch_all(&source, &query).await.unwrap_err();

        assert!(matches!(
            err,
            TedError::ApiError {
                target: RequestTarget::Page(2),
                ..
            }
        ));
        assert_eq!(source.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_field_list_requests_default_field() {
        let source = ScriptedSource::new(0);
        let query = SearchQuery::new("q", vec![]).with_limit(10);

        fetch_all(&source, &query).await.unwrap();

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].fields, vec!["publication-date".to_string()]);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let source = ScriptedSource::new(5);
        let query = SearchQuery::new("q", vec![]).with_limit(0);

        assert!(fetch_all(&source, &query).await.is_err());
        assert!(source.pages_requested().is_empty());
    }

    #[tokio::test]
    async fn test_start_page_zero_is_rejected() {
        let source = ScriptedSource::new(100);
        let query = SearchQuery::new("q", vec![])
            .with_limit(5)
            .with_start_page(0)
            .with_max_pages(3);

        let err = fetch_all(&source, &query).await.unwrap_err();

        assert!(matches!(
            err,
            TedError::InvalidConfigValueError { ref field, .. } if field == "start_page"
        ));
        assert!(source.pages_requested().is_empty());
    }

    #[tokio::test]
    async fn test_zero_max_pages_is_rejected() {
        let source = ScriptedSource::new(100);
        let query = SearchQuery::new("q", vec![]).with_limit(5).with_max_pages(0);

        let err = fetch_all(&source, &query).await.unwrap_err();

        assert!(matches!(
            err,
            TedError::InvalidConfigValueError { ref field, .. } if field == "max_pages"
        ));
        assert!(source.pages_requested().is_empty());
    }

    #[tokio::test]
    async fn test_count_uses_single_minimal_request() {
        let mut source = ScriptedSource::new(112);
        source.advertise_total = true;
        let query = SearchQuery::new("FT=\"kassel\"", vec![]).with_limit(50);

        let count = count_matches(&source, &query).await.unwrap();

        assert_eq!(count, Some(112));
        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!((requests[0].page, requests[0].limit), (1, 1));
    }

    #[tokio::test]
    async fn test_count_without_advertised_total() {
        assert_eq!(
            count_matches(&ScriptedSource::new(0), &SearchQuery::new("q", vec![]))
                .await
                .unwrap(),
            Some(0)
        );
        assert_eq!(
            count_matches(&ScriptedSource::new(3), &SearchQuery::new("q", vec![]))
                .await
                .unwrap(),
            None
        );
    }
}
