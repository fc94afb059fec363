use log::{info, warn};
use tokio::task::JoinSet;

use udss_migrate_config::Settings;
use udss_migrate_db::db;
use udss_migrate_db::pool::DatabasePool;
use udss_migrate_error::{MigrateError, Result};
use udss_migrate_es::client::EsClient;
use udss_migrate_es::pager::{PageQuery, Pager};
use udss_migrate_es::records::SearchHit;

use crate::state::PipelineState;

/// 배치 내 레코드 유형
#[derive(Clone, Copy)]
enum RecordKind {
    Metric,
    Log,
}

/// 마이그레이션 오케스트레이터.
/// 로그/메트릭 두 파이프라인을 동시에 돌리고 배치 내 레코드를
/// 연결 풀 한도 안에서 병렬 처리한다.
pub struct Migrator {
    state: PipelineState,
    source: EsClient,
    page_size: u64,
    analytics_index: String,
    events_index: String,
}

impl Migrator {
    pub fn new(pool: DatabasePool, source: EsClient, settings: &Settings) -> Self {
        Self {
            state: PipelineState::new(pool),
            source,
            page_size: settings.migrate.page_size,
            analytics_index: settings.migrate.analytics_index.clone(),
            events_index: settings.migrate.events_index.clone(),
        }
    }

    /// 전체 마이그레이션 실행.
    /// 고정 테이블 준비 후 두 파이프라인을 동시에 실행하며,
    /// 어느 한쪽이 실패하면 전체가 실패한다.
    pub async fn run(&self) -> Result<()> {
        // 동시성 시작 전 단일 실행이므로 게이트 없이 수행
        db::initialize_db(&self.state.pool).await?;

        tokio::try_join!(self.migrate_analytics(), self.migrate_events())?;

        // 레코드 단위 실패는 건너뛰고 집계했다가 마지막에 실행 실패로 환산
        let failed = self.state.failure_count();
        if failed > 0 {
            return Err(MigrateError::Insert(format!(
                "{failed}개 레코드 적재 실패 (로그의 페이로드 참조)"
            )));
        }

        info!("마이그레이션 완료");
        Ok(())
    }

    /// 메트릭/분석 파이프라인
    async fn migrate_analytics(&self) -> Result<()> {
        let query = PageQuery {
            index: self.analytics_index.clone(),
            page_size: self.page_size,
        };

        let pager = Pager::new(&self.source);
        let stats = pager
            .fetch_all(&query, |batch| self.process_batch(batch, RecordKind::Metric))
            .await?;

        info!(
            "분석 레코드 이관 완료: {}페이지 {}건",
            stats.pages, stats.retrieved
        );
        Ok(())
    }

    /// 호스트 로그 파이프라인
    async fn migrate_events(&self) -> Result<()> {
        let query = PageQuery {
            index: self.events_index.clone(),
            page_size: self.page_size,
        };

        let pager = Pager::new(&self.source);
        let stats = pager
            .fetch_all(&query, |batch| self.process_batch(batch, RecordKind::Log))
            .await?;

        info!(
            "로그 레코드 이관 완료: {}페이지 {}건",
            stats.pages, stats.retrieved
        );
        Ok(())
    }

    /// 한 배치의 레코드를 병렬 처리.
    /// 모든 레코드의 하위 작업이 끝나야 배치가 완료되고 다음 페이지가 요청된다.
    async fn process_batch(&self, batch: Vec<SearchHit>, kind: RecordKind) -> Result<()> {
        let before = self.state.failure_count();

        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        for hit in batch {
            let state = self.state.clone();
            tasks.spawn(async move {
                match kind {
                    RecordKind::Metric => state.process_metric_hit(hit).await,
                    RecordKind::Log => state.process_log_hit(hit).await,
                }
            });
        }

        let result = drain_tasks(&mut tasks).await;

        let after = self.state.failure_count();
        if after > before {
            warn!("적재 실패 누적 {after}건");
        }

        result
    }
}

/// 배치의 모든 태스크 완료를 기다리며 최초의 치명 에러를 전파.
/// 에러가 나도 나머지 레코드의 하위 작업이 끝날 때까지 대기한다.
async fn drain_tasks(tasks: &mut JoinSet<Result<()>>) -> Result<()> {
    let mut first_err: Option<MigrateError> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(MigrateError::Internal(format!("배치 태스크 조인 실패: {e}")));
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
