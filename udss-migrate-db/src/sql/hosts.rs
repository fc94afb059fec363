/// 테이블 생성 쿼리
pub const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS hosts (
        host_id TEXT PRIMARY KEY,
        host_name TEXT NOT NULL
    )";

/// 호스트 존재 확인 쿼리
pub const SELECT_HOST: &str = "SELECT host_id FROM hosts WHERE host_id = $1";

/// 호스트 등록 쿼리 (이미 있으면 무변경)
pub const UPSERT_HOST: &str = "
    INSERT INTO hosts (host_id, host_name)
    VALUES ($1, $2)
    ON CONFLICT (host_id) DO NOTHING
";
