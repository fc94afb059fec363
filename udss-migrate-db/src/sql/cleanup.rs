/// 싱크 스키마 전체 제거 후 재생성 쿼리.
/// 다음 마이그레이션 실행이 고정 테이블을 다시 만든다.
pub const RESET_SCHEMA: &str = "
    DROP SCHEMA public CASCADE;
    CREATE SCHEMA public;
    GRANT ALL ON SCHEMA public TO postgres;
    GRANT ALL ON SCHEMA public TO public;
";
