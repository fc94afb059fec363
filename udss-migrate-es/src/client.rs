use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request};
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use log::{debug, error};
use serde_json::json;

use udss_migrate_error::{MigrateError, Result};

use crate::pager::SearchSource;
use crate::records::SearchResponse;

/// 검색 소스 클라이언트
pub struct EsClient {
    /// HTTP 클라이언트 연결 풀
    client: Arc<HyperClient<HttpConnector, Full<Bytes>>>,
    /// 소스 베이스 URI
    base: String,
    /// 요청 타임아웃
    timeout: Duration,
}

impl EsClient {
    /// 새로운 소스 클라이언트 생성
    pub fn new(host: &str, port: u16, timeout_seconds: u64) -> Self {
        // HTTP 커넥터 설정
        let mut connector = HttpConnector::new();
        connector.set_keepalive(Some(Duration::from_secs(30))); // 연결 유지 시간
        connector.set_nodelay(true); // TCP_NODELAY 활성화 (지연 최소화)

        // HTTP 클라이언트 생성 (연결 풀링 설정)
        let client = Arc::new(
            HyperClient::builder(TokioExecutor::default())
                .pool_idle_timeout(Duration::from_secs(30)) // 유휴 연결 타임아웃
                .build(connector),
        );

        Self {
            client,
            base: format!("http://{host}:{port}"),
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

#[async_trait]
impl SearchSource for EsClient {
    async fn search(&self, index: &str, size: u64, from: u64) -> Result<SearchResponse> {
        let body = json!({
            "query": { "match_all": {} },
            "size": size,
            "from": from,
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/{}/_search", self.base, index))
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(serde_json::to_vec(&body)?)))?;

        debug!("검색 요청: index={index} size={size} from={from}");

        let response = tokio::time::timeout(self.timeout, self.client.request(req)).await??;
        let status = response.status();
        let body_bytes = response.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            error!("검색 요청 실패: {status}");
            return Err(MigrateError::Http(format!("검색 요청 실패: {status}")));
        }

        let parsed: SearchResponse = serde_json::from_slice(&body_bytes)?;

        Ok(parsed)
    }
}
