use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::error;
use tokio_postgres::types::ToSql;

use udss_migrate_db::hosts::HostCache;
use udss_migrate_db::pool::DatabasePool;
use udss_migrate_db::probes::ProbeCache;
use udss_migrate_db::sql::event_logs;
use udss_migrate_error::{MigrateError, Result};
use udss_migrate_es::records::{LogRecord, MetricRecord, SearchHit};

/// 파이프라인이 공유하는 실행 단위 상태.
/// 캐시와 실패 집계를 전역이 아닌 인스턴스로 소유하며,
/// 레코드 단위 태스크로 클론되어 전달된다.
#[derive(Clone)]
pub struct PipelineState {
    pub pool: DatabasePool,
    pub probes: Arc<ProbeCache>,
    pub hosts: Arc<HostCache>,
    /// 적재를 건너뛴 레코드 수
    failures: Arc<AtomicU64>,
}

impl PipelineState {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            probes: Arc::new(ProbeCache::new()),
            hosts: Arc::new(HostCache::new()),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 누적 적재 실패 수
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// 단일 메트릭 레코드 처리.
    /// 페이로드 적재와 호스트 확보를 동시에 수행하고 둘 다 끝나야 완료된다.
    pub async fn process_metric_hit(&self, hit: SearchHit) -> Result<()> {
        let record = match MetricRecord::from_hit(&hit) {
            Ok(record) => record,
            Err(e) => {
                self.record_failure(&hit, &e);
                return Ok(());
            }
        };

        let (persisted, host) = tokio::join!(
            self.insert_metric(&record),
            self.hosts
                .ensure(&self.pool, &record.host_id, &record.host_name),
        );

        host?;
        self.absorb_insert_failure(&hit, persisted)
    }

    /// 단일 로그 레코드 처리
    pub async fn process_log_hit(&self, hit: SearchHit) -> Result<()> {
        let record = match LogRecord::from_hit(&hit) {
            Ok(record) => record,
            Err(e) => {
                self.record_failure(&hit, &e);
                return Ok(());
            }
        };

        let (persisted, host) = tokio::join!(
            self.insert_log(&record),
            self.hosts
                .ensure(&self.pool, &record.host_id, &record.host_name),
        );

        host?;
        self.absorb_insert_failure(&hit, persisted)
    }

    /// 메트릭 적재: 프로브 스키마 확보 후 템플릿으로 삽입.
    /// 두 하위 작업 모두 각자 연결을 잡았다가 끝나는 즉시 반납한다.
    async fn insert_metric(&self, record: &MetricRecord) -> Result<()> {
        let schema = self
            .probes
            .ensure(&self.pool, &record.probe, record.value_names())
            .await?;

        let conn = self.pool.get().await?;

        let values = record.values_for(&schema.value_names);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(values.len() + 3);
        params.push(&record.time);
        params.push(&record.host_id);
        params.push(&record.object_name);
        for value in &values {
            params.push(value);
        }

        conn.execute(schema.insert_sql.as_str(), &params)
            .await
            .map_err(|e| MigrateError::Insert(format!("'{}' 적재 실패: {e}", schema.table_name)))?;

        Ok(())
    }

    /// 로그 적재: 고정 테이블 삽입
    async fn insert_log(&self, record: &LogRecord) -> Result<()> {
        let conn = self.pool.get().await?;

        conn.execute(
            event_logs::INSERT_LOG,
            &[
                &record.host_id,
                &record.component,
                &record.message,
                &record.facility,
                &record.severity,
                &record.time,
                &record.origin,
            ],
        )
        .await
        .map_err(|e| MigrateError::Insert(format!("event_logs 적재 실패: {e}")))?;

        Ok(())
    }

    /// 레코드 단위 적재 실패는 집계 후 건너뛰고, 그 외 에러는 치명으로 전파
    fn absorb_insert_failure(&self, hit: &SearchHit, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e @ MigrateError::Insert(_)) => {
                self.record_failure(hit, &e);
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// 실패 레코드 집계. 진단용으로 원본 페이로드를 남긴다
    fn record_failure(&self, hit: &SearchHit, err: &MigrateError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        error!("레코드 적재 실패: {err}, 페이로드: {}", hit.source);
    }
}
