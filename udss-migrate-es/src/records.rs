use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use udss_migrate_error::{MigrateError, Result};

/// 검색 응답의 전체 레코드 수. 소스 버전에 따라 숫자 또는 객체로 온다
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum TotalCount {
    Plain(u64),
    Keyed { value: u64 },
}

impl TotalCount {
    pub fn value(self) -> u64 {
        match self {
            TotalCount::Plain(n) => n,
            TotalCount::Keyed { value } => value,
        }
    }
}

/// 검색 히트 단건
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// 레코드 유형 판별자. 메트릭은 마지막 ':' 뒤 구간이 프로브 키
    #[serde(rename = "_type", default)]
    pub doc_type: String,
    /// 원본 문서 페이로드
    #[serde(rename = "_source", default)]
    pub source: Value,
}

impl SearchHit {
    /// 판별자에서 프로브 키 추출
    pub fn probe(&self) -> Option<&str> {
        self.doc_type.rsplit(':').next().filter(|s| !s.is_empty())
    }
}

/// hits 봉투
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHits {
    pub total: TotalCount,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// 검색 응답. hits 가 없는 응답은 페이저가 치명 에러로 처리한다
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Option<SearchHits>,
}

/// 수집 메트릭 레코드.
/// 필드 집합은 고정이 아니고 프로브별 첫 레코드에서 발견된다
#[derive(Debug, Clone)]
pub struct MetricRecord {
    pub probe: String,
    pub time: DateTime<Utc>,
    pub host_id: String,
    pub host_name: String,
    pub object_name: String,
    /// 필드 이름(소문자 정규화) → 수치. 순서 결정적
    pub values: BTreeMap<String, f64>,
}

/// 메트릭 페이로드 원본 형태
#[derive(Debug, Deserialize)]
struct MetricSource {
    timestamp: DateTime<Utc>,
    #[serde(rename = "hostId")]
    host_id: String,
    #[serde(rename = "hostName", default)]
    host_name: Option<String>,
    #[serde(rename = "objectName", default)]
    object_name: String,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

impl MetricRecord {
    /// 히트에서 메트릭 레코드 파싱.
    /// 실패는 레코드 단위 적재 실패로 취급한다
    pub fn from_hit(hit: &SearchHit) -> Result<Self> {
        let probe = hit
            .probe()
            .ok_or_else(|| MigrateError::Insert(format!("프로브 판별자 없음: '{}'", hit.doc_type)))?
            .to_string();

        let src: MetricSource = serde_json::from_value(hit.source.clone())
            .map_err(|e| MigrateError::Insert(format!("메트릭 페이로드 파싱 실패: {e}")))?;

        // 필드 키 소문자 정규화, 비숫자 값은 0 으로 강제
        let values = src
            .values
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.as_f64().unwrap_or(0.0)))
            .collect();

        Ok(Self {
            probe,
            time: src.timestamp,
            host_name: src.host_name.unwrap_or_else(|| src.host_id.clone()),
            host_id: src.host_id,
            object_name: src.object_name,
            values,
        })
    }

    /// 스키마에 고정된 필드 순서에 맞춘 값 목록. 누락 필드는 0
    pub fn values_for(&self, value_names: &[String]) -> Vec<f64> {
        value_names
            .iter()
            .map(|name| self.values.get(name).copied().unwrap_or(0.0))
            .collect()
    }

    /// 이 레코드가 가진 필드 이름 목록
    pub fn value_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// 호스트 로그 이벤트 레코드 (고정 형태)
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub host_id: String,
    pub host_name: String,
    pub component: String,
    pub message: String,
    pub facility: String,
    pub severity: String,
    pub time: DateTime<Utc>,
    pub origin: String,
}

/// 로그 페이로드 원본 형태
#[derive(Debug, Deserialize)]
struct LogSource {
    timestamp: DateTime<Utc>,
    #[serde(rename = "hostId")]
    host_id: String,
    #[serde(rename = "hostName", default)]
    host_name: Option<String>,
    #[serde(default)]
    component: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    facility: Value,
    #[serde(default)]
    severity: Value,
    #[serde(default)]
    origin: String,
}

impl LogRecord {
    /// 히트에서 로그 레코드 파싱
    pub fn from_hit(hit: &SearchHit) -> Result<Self> {
        let src: LogSource = serde_json::from_value(hit.source.clone())
            .map_err(|e| MigrateError::Insert(format!("로그 페이로드 파싱 실패: {e}")))?;

        Ok(Self {
            host_name: src.host_name.unwrap_or_else(|| src.host_id.clone()),
            host_id: src.host_id,
            component: src.component,
            message: src.message,
            facility: value_text(&src.facility),
            severity: value_text(&src.severity),
            time: src.timestamp,
            origin: src.origin,
        })
    }
}

/// 문자열 또는 숫자로 오는 필드를 텍스트로 정규화
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
