use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use log::info;

use udss_migrate_error::{MigrateError, Result};

use crate::progress::ProgressReport;
use crate::records::{SearchHit, SearchResponse};

/// 페이지 조회 쿼리. 쿼리는 불변이고 커서는 조회 루프의 내부 상태
#[derive(Debug, Clone)]
pub struct PageQuery {
    /// 소스 인덱스 패턴
    pub index: String,
    /// 페이지당 레코드 수
    pub page_size: u64,
}

/// 전체 조회 결과 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub total: u64,
    pub retrieved: u64,
    pub pages: u64,
}

/// 페이지 단위 검색 소스
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// 지정 오프셋에서 한 페이지 조회
    async fn search(&self, index: &str, size: u64, from: u64) -> Result<SearchResponse>;
}

/// 페이지네이션 드라이버.
/// 전체 수는 첫 페이지에서 한번 확정되고 이후 변하지 않는다
pub struct Pager<'a, S: SearchSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: SearchSource + ?Sized> Pager<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// 전체 페이지 순회.
    /// 각 배치는 처리 완료까지 대기한 뒤에야 다음 페이지를 요청한다 (페이지 단위 역압).
    /// hits 없는 응답과 조기 고갈은 치명 에러로 전체 실행을 중단시킨다.
    pub async fn fetch_all<F, Fut>(&self, query: &PageQuery, mut on_batch: F) -> Result<FetchStats>
    where
        F: FnMut(Vec<SearchHit>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut known_total: Option<u64> = None;
        let mut retrieved: u64 = 0;
        let mut from: u64 = 0;
        let mut pages: u64 = 0;
        let started = Instant::now();

        loop {
            let page_started = Instant::now();

            let response = self
                .source
                .search(&query.index, query.page_size, from)
                .await?;

            let envelope = response.hits.ok_or_else(|| {
                MigrateError::Extraction(format!(
                    "'{}' 응답에 사용할 수 있는 hits 없음",
                    query.index
                ))
            })?;

            // 전체 수는 첫 페이지 값으로 고정
            let total = *known_total.get_or_insert_with(|| envelope.total.value());

            let batch = envelope.hits;
            let len = batch.len() as u64;

            pages += 1;
            retrieved += len;
            from += len;

            if len > 0 {
                on_batch(batch).await?;
            }

            let report = ProgressReport::compute(
                retrieved,
                total,
                started.elapsed(),
                page_started.elapsed(),
                len,
            );
            info!("{}: {}", query.index, report);

            if retrieved >= total {
                break;
            }
            if len == 0 {
                // 남은 레코드가 있는데 빈 페이지: 소스 조기 고갈
                return Err(MigrateError::Extraction(format!(
                    "'{}' 소스 조기 고갈: {retrieved}/{total}",
                    query.index
                )));
            }
        }

        Ok(FetchStats {
            total: known_total.unwrap_or(0),
            retrieved,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use serde_json::Value;

    use crate::records::{SearchHits, TotalCount};

    /// 지정한 전체 수를 페이지 단위로 나눠 응답하는 모의 소스
    struct ScriptedSource {
        total: u64,
        calls: AtomicU64,
        events: Mutex<Vec<String>>,
        /// 두번째 페이지부터 빈 응답 (조기 고갈 시뮬레이션)
        exhaust_after_first: bool,
    }

    impl ScriptedSource {
        fn new(total: u64) -> Self {
            Self {
                total,
                calls: AtomicU64::new(0),
                events: Mutex::new(Vec::new()),
                exhaust_after_first: false,
            }
        }

        fn hit(offset: u64) -> SearchHit {
            SearchHit {
                doc_type: format!("analytics:rec{offset}"),
                source: Value::Null,
            }
        }

        fn log(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl SearchSource for ScriptedSource {
        async fn search(&self, _index: &str, size: u64, from: u64) -> Result<SearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log(format!("search:{from}"));

            let remaining = self.total.saturating_sub(from);
            let len = if self.exhaust_after_first && from > 0 {
                0
            } else {
                remaining.min(size)
            };

            Ok(SearchResponse {
                hits: Some(SearchHits {
                    total: TotalCount::Plain(self.total),
                    hits: (from..from + len).map(Self::hit).collect(),
                }),
            })
        }
    }

    /// hits 봉투가 아예 없는 소스
    struct EmptySource;

    #[async_trait]
    impl SearchSource for EmptySource {
        async fn search(&self, _index: &str, _size: u64, _from: u64) -> Result<SearchResponse> {
            Ok(SearchResponse { hits: None })
        }
    }

    fn query(page_size: u64) -> PageQuery {
        PageQuery {
            index: "analytics-*".to_string(),
            page_size,
        }
    }

    #[tokio::test]
    async fn fetches_every_page_without_gaps() {
        // T=250, P=100 → 100, 100, 50 세 페이지
        let source = ScriptedSource::new(250);
        let pager = Pager::new(&source);

        let mut batch_sizes = Vec::new();
        let mut seen = Vec::new();
        let stats = pager
            .fetch_all(&query(100), |batch| {
                batch_sizes.push(batch.len());
                seen.extend(batch.into_iter().map(|h| h.doc_type));
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(stats, FetchStats { total: 250, retrieved: 250, pages: 3 });
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(batch_sizes, vec![100, 100, 50]);

        // 누락/중복 없이 이어진다
        assert_eq!(seen.len(), 250);
        seen.dedup();
        assert_eq!(seen.len(), 250);
    }

    #[tokio::test]
    async fn exact_page_division() {
        let source = ScriptedSource::new(200);
        let pager = Pager::new(&source);

        let stats = pager
            .fetch_all(&query(100), |_| async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(stats.retrieved, 200);
    }

    #[tokio::test]
    async fn batch_completes_before_next_page_request() {
        let source = ScriptedSource::new(250);

        {
            let pager = Pager::new(&source);
            pager
                .fetch_all(&query(100), |batch| {
                    source.log(format!("batch:{}", batch.len()));
                    async { Ok(()) }
                })
                .await
                .unwrap();
        }

        let events = source.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "search:0",
                "batch:100",
                "search:100",
                "batch:100",
                "search:200",
                "batch:50",
            ]
        );
    }

    #[tokio::test]
    async fn missing_hits_is_fatal() {
        let pager = Pager::new(&EmptySource);
        let err = pager
            .fetch_all(&query(100), |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Extraction(_)));
    }

    #[tokio::test]
    async fn early_exhaustion_is_fatal() {
        let mut source = ScriptedSource::new(300);
        source.exhaust_after_first = true;
        let pager = Pager::new(&source);

        let err = pager
            .fetch_all(&query(100), |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Extraction(_)));
    }

    #[tokio::test]
    async fn zero_total_completes_without_batches() {
        let source = ScriptedSource::new(0);
        let pager = Pager::new(&source);

        let mut called = false;
        let stats = pager
            .fetch_all(&query(100), |_| {
                called = true;
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(stats, FetchStats { total: 0, retrieved: 0, pages: 1 });
        assert!(!called);
    }

    #[tokio::test]
    async fn batch_error_stops_paging() {
        let source = ScriptedSource::new(250);
        let pager = Pager::new(&source);

        let err = pager
            .fetch_all(&query(100), |_| async {
                Err(MigrateError::Database("적재 경로 중단".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Database(_)));
        // 실패한 배치 이후 추가 페이지를 요청하지 않는다
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
