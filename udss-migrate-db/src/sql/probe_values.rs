/// 테이블 생성 쿼리
pub const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS probe_values (
        id BIGSERIAL PRIMARY KEY,
        probe TEXT NOT NULL,
        value_name TEXT NOT NULL
    )";

/// 기본 인덱스 생성 쿼리
pub const CREATE_INDICES: [&str; 1] = [
    "CREATE INDEX IF NOT EXISTS probe_values_probe_idx ON probe_values(probe, value_name)",
];

/// 프로브 필드 목록 조회 쿼리
pub const SELECT_VALUES: &str = "
    SELECT value_name
    FROM probe_values
    WHERE probe = $1
    ORDER BY value_name
";

/// 프로브 필드 등록 쿼리
pub const INSERT_VALUE: &str = "INSERT INTO probe_values (probe, value_name) VALUES ($1, $2)";
