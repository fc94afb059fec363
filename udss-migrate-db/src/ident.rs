use once_cell::sync::Lazy;
use regex::Regex;

use udss_migrate_error::{MigrateError, Result};

/// 허용되는 식별자 패턴 (소문자 변환 후 검사)
static IDENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z_][a-z0-9_]*$").unwrap());

/// 식별자 최대 길이. `analytics_` 접두사를 붙여도 PostgreSQL 한도(63바이트) 안쪽
const MAX_IDENT_LEN: usize = 40;

/// 소스 문서에서 유래한 이름을 SQL 식별자로 검증.
/// 테이블/컬럼 이름은 파라미터 바인딩이 불가능하므로 DDL/DML 조립 전에 반드시 거친다.
pub fn validate_identifier(name: &str) -> Result<String> {
    let lowered = name.to_ascii_lowercase();

    if lowered.is_empty() || lowered.len() > MAX_IDENT_LEN {
        return Err(MigrateError::Schema(format!(
            "식별자 길이 위반 (1~{MAX_IDENT_LEN}바이트): '{name}'"
        )));
    }

    if !IDENT_PATTERN.is_match(&lowered) {
        return Err(MigrateError::Schema(format!(
            "허용되지 않는 식별자: '{name}'"
        )));
    }

    Ok(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert_eq!(validate_identifier("cpu").unwrap(), "cpu");
        assert_eq!(validate_identifier("disk_used").unwrap(), "disk_used");
        assert_eq!(validate_identifier("_internal0").unwrap(), "_internal0");
    }

    #[test]
    fn lowercases_mixed_case() {
        assert_eq!(validate_identifier("CpuUser").unwrap(), "cpuuser");
    }

    #[test]
    fn rejects_unsafe_names() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1cpu").is_err());
        assert!(validate_identifier("cpu-user").is_err());
        assert!(validate_identifier("cpu user").is_err());
        assert!(validate_identifier("x; DROP TABLE hosts; --").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }
}
