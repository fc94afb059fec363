use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use udss_migrate_error::Result;

/// 마이그레이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 페이지당 레코드 수
    pub page_size: u64,
    /// 분석 레코드 소스 인덱스 패턴
    pub analytics_index: String,
    /// 로그 레코드 소스 인덱스 패턴
    pub events_index: String,
    /// 소스 기본 포트 (host 인자에 포트가 없을 때)
    pub source_port: u16,
    /// 검색 요청 타임아웃(초)
    pub search_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// 기본설정으로 생성
    #[must_use]
    pub fn new() -> Self {
        Self {
            page_size: 100,
            analytics_index: "analytics-*".to_string(),
            events_index: "logs-*".to_string(),
            source_port: 9200,
            search_timeout_seconds: 30,
        }
    }

    /// 설정파일에서 설정 로드
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config = serde_yml::from_str(&contents)?;

        Ok(config)
    }
}
