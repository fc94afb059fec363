use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use log::debug;

use udss_migrate_error::Result;

use crate::pool::DatabasePool;
use crate::sql::hosts;

/// 호스트 영속화 계층
#[async_trait]
pub trait HostStore: Send + Sync {
    /// 호스트 행이 없으면 등록. 동시 등록은 db 충돌 무시 upsert 가 흡수한다
    async fn persist_host(&self, host_id: &str, host_name: &str) -> Result<()>;
}

/// 호스트 중복 제거 캐시.
/// 메모리 캐시는 반복 목격 시 왕복을 생략하는 최적화일 뿐이고,
/// 정합성은 db 의 충돌 무시 upsert 가 보장한다.
pub struct HostCache {
    seen: RwLock<HashSet<String>>,
}

impl Default for HostCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCache {
    pub fn new() -> Self {
        Self {
            seen: RwLock::new(HashSet::new()),
        }
    }

    /// 호스트 확보 (멱등).
    /// 캐시 적중 시 즉시 반환, 미적중 시 한번의 왕복 후 결과와 무관하게 캐시에 기록
    pub async fn ensure<S>(&self, store: &S, host_id: &str, host_name: &str) -> Result<()>
    where
        S: HostStore + ?Sized,
    {
        {
            let guard = self.seen.read()?;
            if guard.contains(host_id) {
                return Ok(());
            }
        }

        store.persist_host(host_id, host_name).await?;

        let mut guard = self.seen.write()?;
        guard.insert(host_id.to_string());

        Ok(())
    }
}

#[async_trait]
impl HostStore for DatabasePool {
    async fn persist_host(&self, host_id: &str, host_name: &str) -> Result<()> {
        let conn = self.get().await?;

        let rows = conn.query(hosts::SELECT_HOST, &[&host_id]).await?;
        if rows.is_empty() {
            conn.execute(hosts::UPSERT_HOST, &[&host_id, &host_name])
                .await?;
            debug!("신규 호스트 등록: {host_id} ({host_name})");
        }

        Ok(())
    }
}
