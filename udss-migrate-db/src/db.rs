use log::info;

use udss_migrate_error::Result;

use crate::pool::DatabasePool;
use crate::sql::{cleanup, event_logs, hosts, probe_values};

/// 고정 테이블 초기화.
/// 파이프라인 시작 전에 단 한번 실행되므로 게이트 없이 무조건 DDL 을 수행하며,
/// 실패는 마이그레이션 전체를 중단시킨다.
pub async fn initialize_db(pool: &DatabasePool) -> Result<()> {
    let conn = pool.get().await?;

    // probe_values 메타데이터 테이블
    conn.execute(probe_values::CREATE_TABLE, &[]).await?;
    for index_query in probe_values::CREATE_INDICES {
        conn.execute(index_query, &[]).await?;
    }

    // event_logs 로그 테이블
    conn.execute(event_logs::CREATE_TABLE, &[]).await?;
    for index_query in event_logs::CREATE_INDICES {
        conn.execute(index_query, &[]).await?;
    }

    // hosts 테이블
    conn.execute(hosts::CREATE_TABLE, &[]).await?;

    info!("고정 테이블 준비 완료");

    Ok(())
}

/// 싱크 스키마 전체 제거 후 재생성 (파괴적 초기화 경로)
pub async fn cleanup_db(pool: &DatabasePool) -> Result<()> {
    info!("싱크 스키마 제거 및 재생성");

    let conn = pool.get().await?;
    conn.batch_execute(cleanup::RESET_SCHEMA).await?;

    info!("클린업 완료");

    Ok(())
}
