use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{error, info};
use tokio::sync::watch;

use udss_migrate_error::{MigrateError, Result};

use crate::ident::validate_identifier;
use crate::pool::DatabasePool;
use crate::sql::probe_values;

/// 프로브 하나에 대해 생성된 스키마.
/// 생성 이후 불변이며 실행 내내 프로브당 정확히 하나만 존재한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSchema {
    /// 프로브 키
    pub probe: String,
    /// 정렬된 필드 이름 목록. 최초 발견 시점에 고정
    pub value_names: Vec<String>,
    /// 백업 테이블 이름
    pub table_name: String,
    /// 파라미터화된 적재 템플릿
    pub insert_sql: String,
}

impl ProbeSchema {
    fn build(probe: &str, value_names: Vec<String>) -> Self {
        Self {
            table_name: table_name(probe),
            insert_sql: build_insert_sql(probe, &value_names),
            probe: probe.to_string(),
            value_names,
        }
    }
}

/// 프로브 백업 테이블 이름
pub fn table_name(probe: &str) -> String {
    format!("analytics_{probe}")
}

/// 프로브 테이블 + 인덱스 생성 DDL 조립.
/// 식별자는 사전 검증을 거친 값만 받는다.
pub fn build_create_table_sql(probe: &str, value_names: &[String]) -> String {
    let table = table_name(probe);

    let mut columns = String::new();
    for name in value_names {
        columns.push_str(",\n        ");
        columns.push_str(name);
        columns.push_str(" DOUBLE PRECISION NOT NULL DEFAULT 0");
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
        id BIGSERIAL PRIMARY KEY,
        time TIMESTAMPTZ NOT NULL,
        host_id TEXT NOT NULL,
        object_name TEXT NOT NULL{columns}
    );
    CREATE INDEX IF NOT EXISTS {table}_src_idx ON {table} (host_id, time, object_name)"
    )
}

/// 프로브 테이블 적재 템플릿 조립
pub fn build_insert_sql(probe: &str, value_names: &[String]) -> String {
    let table = table_name(probe);

    let mut columns = String::from("time, host_id, object_name");
    let mut params = String::from("$1, $2, $3");
    for (i, name) in value_names.iter().enumerate() {
        columns.push_str(", ");
        columns.push_str(name);
        params.push_str(&format!(", ${}", i + 4));
    }

    format!("INSERT INTO {table} ({columns}) VALUES ({params})")
}

/// 생성 결과 게이트 채널에 실리는 값
type Outcome = Option<std::result::Result<Arc<ProbeSchema>, String>>;

/// 프로브별 캐시 상태
enum ProbeState {
    /// 스키마 확정, 즉시 반환 가능
    Ready(Arc<ProbeSchema>),
    /// 생성 진행 중. 대기자는 채널로 결과를 받는다
    Creating(watch::Receiver<Outcome>),
}

/// 프로브 영속화 계층.
/// 메타데이터 재확인과 테이블 생성을 한 트랜잭션으로 수행한다.
#[async_trait]
pub trait ProbeStore: Send + Sync {
    /// 저장된 메타데이터가 있으면 그 필드 목록을 반환하고,
    /// 없으면 메타데이터와 테이블을 생성한 뒤 요청 필드 목록을 반환한다.
    async fn fetch_or_create(&self, probe: &str, value_names: &[String]) -> Result<Vec<String>>;
}

/// 프로브 스키마 캐시.
/// 키별 게이트로 동시 최초 접근에서도 테이블 생성이 프로브당 정확히 한번만 일어난다.
pub struct ProbeCache {
    probes: Mutex<HashMap<String, ProbeState>>,
}

impl Default for ProbeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeCache {
    pub fn new() -> Self {
        Self {
            probes: Mutex::new(HashMap::new()),
        }
    }

    /// 프로브 스키마 확보.
    /// 캐시 적중 시 I/O 없이 반환. 미적중 시 최초 호출자가 생성자가 되고
    /// 나머지는 게이트에서 생성 결과를 대기한다. 생성 실패 시 캐시에서
    /// 항목을 제거해 이후 호출이 깨끗하게 재시도할 수 있게 한다.
    pub async fn ensure<S>(
        &self,
        store: &S,
        probe: &str,
        value_names: Vec<String>,
    ) -> Result<Arc<ProbeSchema>>
    where
        S: ProbeStore + ?Sized,
    {
        let probe = validate_identifier(probe)?;

        let mut names = Vec::with_capacity(value_names.len());
        for name in &value_names {
            names.push(validate_identifier(name)?);
        }
        names.sort();
        names.dedup();

        loop {
            let gate = {
                let mut guard = self.probes.lock()?;
                match guard.get(&probe) {
                    Some(ProbeState::Ready(schema)) => return Ok(schema.clone()),
                    Some(ProbeState::Creating(rx)) => Gate::Waiter(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        guard.insert(probe.clone(), ProbeState::Creating(rx));
                        Gate::Creator(tx)
                    }
                }
            };

            match gate {
                Gate::Waiter(mut rx) => {
                    if rx.changed().await.is_err() {
                        // 결과 없이 닫힌 채널: 생성자가 비정상 종료
                        return Err(MigrateError::Internal(format!(
                            "프로브 '{probe}' 생성 게이트가 결과 없이 닫힘"
                        )));
                    }
                    match rx.borrow().clone() {
                        Some(Ok(schema)) => return Ok(schema),
                        Some(Err(msg)) => return Err(MigrateError::Schema(msg)),
                        None => continue,
                    }
                }
                Gate::Creator(tx) => {
                    return self.create(store, &probe, names, tx).await;
                }
            }
        }
    }

    /// 생성자 경로: 영속화 수행 후 캐시 갱신과 대기자 통지
    async fn create<S>(
        &self,
        store: &S,
        probe: &str,
        names: Vec<String>,
        tx: watch::Sender<Outcome>,
    ) -> Result<Arc<ProbeSchema>>
    where
        S: ProbeStore + ?Sized,
    {
        match store.fetch_or_create(probe, &names).await {
            Ok(stored_names) => {
                let schema = Arc::new(ProbeSchema::build(probe, stored_names));
                let mut guard = self.probes.lock()?;
                guard.insert(probe.to_string(), ProbeState::Ready(schema.clone()));
                let _ = tx.send(Some(Ok(schema.clone())));
                Ok(schema)
            }
            Err(e) => {
                error!("프로브 '{probe}' 스키마 생성 실패: {e}");
                let msg = format!("프로브 '{probe}' 생성 실패: {e}");
                let mut guard = self.probes.lock()?;
                guard.remove(probe);
                let _ = tx.send(Some(Err(msg.clone())));
                Err(MigrateError::Schema(msg))
            }
        }
    }
}

/// ensure 호출자가 락 해제 후 수행할 역할
enum Gate {
    Waiter(watch::Receiver<Outcome>),
    Creator(watch::Sender<Outcome>),
}

#[async_trait]
impl ProbeStore for DatabasePool {
    async fn fetch_or_create(&self, probe: &str, value_names: &[String]) -> Result<Vec<String>> {
        let mut conn = self.get().await?;
        let tx = conn.transaction().await?;

        // 교차 프로세스 방어: 커밋된 메타데이터를 트랜잭션 안에서 재확인
        let rows = tx.query(probe_values::SELECT_VALUES, &[&probe]).await?;
        if !rows.is_empty() {
            let mut names = Vec::with_capacity(rows.len());
            for row in rows {
                names.push(row.try_get::<usize, String>(0)?);
            }
            tx.commit().await?;
            info!(
                "기존 프로브 메타데이터 재사용: {} ({}개 필드)",
                probe,
                names.len()
            );
            return Ok(names);
        }

        info!("신규 프로브: {} [{}]", probe, value_names.join(", "));

        for name in value_names {
            tx.execute(probe_values::INSERT_VALUE, &[&probe, &name])
                .await?;
        }

        let ddl = build_create_table_sql(probe, value_names);
        match tokio::time::timeout(
            tokio::time::Duration::from_secs(10), // 10초 타임아웃
            tx.batch_execute(&ddl),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("프로브 테이블 생성 실패: {e}");
                return Err(e.into());
            }
            Err(e) => {
                error!("프로브 테이블 생성 타임아웃: {probe}");
                return Err(e.into());
            }
        }

        // 커밋 실패를 포함한 모든 에러 경로에서 트랜잭션은 드랍 시 롤백
        tx.commit().await?;

        Ok(value_names.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use tokio::sync::Barrier;

    use udss_migrate_error::db_err;

    /// 영속화 호출 횟수를 세는 모의 스토어
    struct MockStore {
        calls: AtomicU64,
        delay: Duration,
        stored: Option<Vec<String>>,
        fail: bool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
                delay: Duration::from_millis(20),
                stored: None,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn with_stored(names: &[&str]) -> Self {
            Self {
                stored: Some(names.iter().map(|s| s.to_string()).collect()),
                ..Self::new()
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProbeStore for MockStore {
        async fn fetch_or_create(
            &self,
            _probe: &str,
            value_names: &[String],
        ) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(db_err("모의 생성 실패"));
            }
            match &self.stored {
                Some(names) => Ok(names.clone()),
                None => Ok(value_names.to_vec()),
            }
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_sql_parameter_order() {
        let sql = build_insert_sql("disk", &names(&["total", "used"]));
        assert_eq!(
            sql,
            "INSERT INTO analytics_disk (time, host_id, object_name, total, used) \
             VALUES ($1, $2, $3, $4, $5)"
        );
    }

    #[test]
    fn insert_sql_without_value_fields() {
        let sql = build_insert_sql("ping", &[]);
        assert_eq!(
            sql,
            "INSERT INTO analytics_ping (time, host_id, object_name) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn create_table_sql_contains_value_columns() {
        let sql = build_create_table_sql("disk", &names(&["total", "used"]));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS analytics_disk"));
        assert!(sql.contains("total DOUBLE PRECISION NOT NULL DEFAULT 0"));
        assert!(sql.contains("used DOUBLE PRECISION NOT NULL DEFAULT 0"));
        assert!(sql.contains(
            "CREATE INDEX IF NOT EXISTS analytics_disk_src_idx \
             ON analytics_disk (host_id, time, object_name)"
        ));
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let cache = ProbeCache::new();
        let store = MockStore::new();

        let first = cache
            .ensure(&store, "temp", names(&["cpu", "mem"]))
            .await
            .unwrap();
        let second = cache
            .ensure(&store, "temp", names(&["cpu", "mem"]))
            .await
            .unwrap();

        assert_eq!(store.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ensure_creates_once() {
        let cache = Arc::new(ProbeCache::new());
        let store = Arc::new(MockStore::new());
        let barrier = Arc::new(Barrier::new(8));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                cache.ensure(&*store, "temp", names(&["cpu", "mem"])).await
            }));
        }

        let mut schemas = Vec::new();
        for handle in handles {
            schemas.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(store.calls(), 1);
        for schema in &schemas {
            assert_eq!(schema.insert_sql, schemas[0].insert_sql);
        }
    }

    #[tokio::test]
    async fn failed_creation_leaves_cache_clean() {
        let cache = ProbeCache::new();

        let failing = MockStore::failing();
        let err = cache
            .ensure(&failing, "temp", names(&["cpu"]))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Schema(_)));

        // 실패한 프로브는 캐시에 남지 않아 다음 호출이 재시도한다
        let store = MockStore::new();
        let schema = cache.ensure(&store, "temp", names(&["cpu"])).await.unwrap();
        assert_eq!(store.calls(), 1);
        assert_eq!(schema.table_name, "analytics_temp");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waiters_observe_creation_failure() {
        let cache = Arc::new(ProbeCache::new());
        let store = Arc::new(MockStore::failing());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                cache.ensure(&*store, "temp", names(&["cpu"])).await
            }));
        }

        for handle in handles {
            assert!(matches!(
                handle.await.unwrap(),
                Err(MigrateError::Schema(_))
            ));
        }
    }

    #[tokio::test]
    async fn persisted_metadata_wins_over_request() {
        let cache = ProbeCache::new();
        let store = MockStore::with_stored(&["swap", "wired"]);

        let schema = cache
            .ensure(&store, "mem", names(&["free", "used"]))
            .await
            .unwrap();

        // 다른 프로세스가 먼저 만든 필드 목록이 스키마의 진실이 된다
        assert_eq!(schema.value_names, names(&["swap", "wired"]));
        assert!(schema.insert_sql.contains("swap, wired"));
    }

    #[tokio::test]
    async fn field_order_is_sorted_and_deduplicated() {
        let cache = ProbeCache::new();
        let store = MockStore::new();

        let schema = cache
            .ensure(&store, "disk", names(&["used", "total", "USED"]))
            .await
            .unwrap();

        assert_eq!(schema.value_names, names(&["total", "used"]));
    }

    #[tokio::test]
    async fn rejects_unsafe_probe_and_fields() {
        let cache = ProbeCache::new();
        let store = MockStore::new();

        assert!(cache
            .ensure(&store, "temp; DROP TABLE hosts", names(&["cpu"]))
            .await
            .is_err());
        assert!(cache
            .ensure(&store, "temp", names(&["cpu\"", "mem"]))
            .await
            .is_err());

        // 검증 실패는 영속화 시도 전에 걸러진다
        assert_eq!(store.calls(), 0);
    }
}
