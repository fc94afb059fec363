use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::PoisonError;

use deadpool_postgres::PoolError;
use hyper::Error as HyperError;
use hyper::http::Error as HttpBuildError;
use hyper_util::client::legacy::Error as HyperClientError;
use serde_json::Error as JsonError;
use serde_yml::Error as YmlError;
use tokio::time::error::Elapsed;
use tokio_postgres::Error as PgError;

/// 마이그레이션 도구의 모든 에러 타입을 정의합니다.
#[derive(Debug)]
pub enum MigrateError {
    /// 설정 관련 에러
    Config(String),

    /// 입출력 에러
    Io(io::Error),

    /// 데이터베이스 관련 에러
    Database(String),

    /// 소스 페이지 추출 에러 (결과 누락, 조기 고갈)
    Extraction(String),

    /// 프로브 스키마 생성 에러 (DDL, 메타데이터 적재 실패)
    Schema(String),

    /// 단일 레코드 적재 에러
    Insert(String),

    /// HTTP 요청/응답 에러
    Http(String),

    /// 타임아웃 에러
    Timeout(String),

    /// 내부 상태 관련 에러
    Internal(String),

    /// 기타 에러
    Other(String),
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrateError::Config(msg) => write!(f, "설정 에러: {}", msg),
            MigrateError::Io(err) => write!(f, "I/O 에러: {}", err),
            MigrateError::Database(msg) => write!(f, "데이터베이스 에러: {}", msg),
            MigrateError::Extraction(msg) => write!(f, "추출 에러: {}", msg),
            MigrateError::Schema(msg) => write!(f, "스키마 생성 에러: {}", msg),
            MigrateError::Insert(msg) => write!(f, "레코드 적재 에러: {}", msg),
            MigrateError::Http(msg) => write!(f, "HTTP 에러: {}", msg),
            MigrateError::Timeout(msg) => write!(f, "타임아웃 에러: {}", msg),
            MigrateError::Internal(msg) => write!(f, "내부 에러: {}", msg),
            MigrateError::Other(msg) => write!(f, "기타 에러: {}", msg),
        }
    }
}

impl StdError for MigrateError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MigrateError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Result 타입 별칭 정의
pub type Result<T> = std::result::Result<T, MigrateError>;

/// From 트레이트 구현으로 다양한 에러 타입을 MigrateError로 변환
impl From<io::Error> for MigrateError {
    fn from(err: io::Error) -> Self {
        MigrateError::Io(err)
    }
}

impl From<PoolError> for MigrateError {
    fn from(err: PoolError) -> Self {
        MigrateError::Database(format!("DB 풀 에러: {}", err))
    }
}

impl From<PgError> for MigrateError {
    fn from(err: PgError) -> Self {
        MigrateError::Database(format!("PostgreSQL 에러: {}", err))
    }
}

impl From<YmlError> for MigrateError {
    fn from(err: YmlError) -> Self {
        MigrateError::Config(format!("YAML 파싱 에러: {}", err))
    }
}

impl From<JsonError> for MigrateError {
    fn from(err: JsonError) -> Self {
        MigrateError::Extraction(format!("응답 JSON 파싱 에러: {}", err))
    }
}

impl From<HyperError> for MigrateError {
    fn from(err: HyperError) -> Self {
        MigrateError::Http(format!("HTTP 에러: {}", err))
    }
}

impl From<HyperClientError> for MigrateError {
    fn from(err: HyperClientError) -> Self {
        MigrateError::Http(format!("HTTP 클라이언트 에러: {}", err))
    }
}

impl From<HttpBuildError> for MigrateError {
    fn from(err: HttpBuildError) -> Self {
        MigrateError::Http(format!("HTTP 요청 구성 에러: {}", err))
    }
}

impl From<Elapsed> for MigrateError {
    fn from(err: Elapsed) -> Self {
        MigrateError::Timeout(format!("작업 타임아웃: {}", err))
    }
}

impl<T> From<PoisonError<T>> for MigrateError {
    fn from(err: PoisonError<T>) -> Self {
        MigrateError::Internal(format!("락 포이즌 에러: {}", err))
    }
}

impl From<String> for MigrateError {
    fn from(err: String) -> Self {
        MigrateError::Other(err)
    }
}

impl From<&str> for MigrateError {
    fn from(err: &str) -> Self {
        MigrateError::Other(err.to_string())
    }
}

/// 에러 처리 유틸리티 함수
pub fn config_err<E: fmt::Display>(err: E) -> MigrateError {
    MigrateError::Config(format!("{}", err))
}

pub fn db_err<E: fmt::Display>(err: E) -> MigrateError {
    MigrateError::Database(format!("{}", err))
}

pub fn extract_err<E: fmt::Display>(err: E) -> MigrateError {
    MigrateError::Extraction(format!("{}", err))
}

pub fn schema_err<E: fmt::Display>(err: E) -> MigrateError {
    MigrateError::Schema(format!("{}", err))
}

pub fn insert_err<E: fmt::Display>(err: E) -> MigrateError {
    MigrateError::Insert(format!("{}", err))
}

pub fn internal_err<E: fmt::Display>(err: E) -> MigrateError {
    MigrateError::Internal(format!("{}", err))
}
