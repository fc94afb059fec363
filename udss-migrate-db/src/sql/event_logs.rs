/// 테이블 생성 쿼리
pub const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS event_logs (
        id BIGSERIAL PRIMARY KEY,
        host_id TEXT NOT NULL,
        component TEXT NOT NULL,
        message TEXT NOT NULL,
        facility TEXT NOT NULL,
        severity TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        origin TEXT NOT NULL
    )";

/// 기본 인덱스 생성 쿼리
pub const CREATE_INDICES: [&str; 1] = [
    "CREATE INDEX IF NOT EXISTS event_logs_host_severity_idx ON event_logs(host_id, severity)",
];

/// 로그 레코드 적재 쿼리
pub const INSERT_LOG: &str = "
    INSERT INTO event_logs (host_id, component, message, facility, severity, timestamp, origin)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
";
