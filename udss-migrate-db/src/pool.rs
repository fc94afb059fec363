use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use log::info;
use tokio_postgres::{
    NoTls,
    config::{Config, SslMode},
};

use udss_migrate_config::DbConfig;
use udss_migrate_error::{MigrateError, Result};

/// 싱크 db 연결 풀.
/// 크기가 고정되어 배치 내 동시 적재 수를 자연스럽게 제한한다.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Arc<Pool>,
}

impl DatabasePool {
    /// 설정으로부터 풀 생성 후 연결 확인
    pub async fn new(dbconfig: &DbConfig) -> Result<Self> {
        let conn = &dbconfig.connection;

        let ssl_mode = match conn.sslmode.to_lowercase().as_str() {
            "disable" => SslMode::Disable,
            "require" => SslMode::Require,
            _ => SslMode::Prefer,
        };

        let mut pg_config = Config::new();
        pg_config
            .host(conn.host.as_str())
            .port(conn.port)
            .dbname(conn.database.as_str())
            .user(conn.user.as_str())
            .password(conn.password.as_str())
            .ssl_mode(ssl_mode)
            .connect_timeout(Duration::from_secs(
                dbconfig.pool.connection_timeout_seconds,
            ))
            .keepalives(true);

        let mgr = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        // 풀 고갈 시 get 은 실패하지 않고 연결 반환을 대기
        let pool = Pool::builder(mgr)
            .max_size(dbconfig.pool.max_connections)
            .runtime(Runtime::Tokio1)
            .recycle_timeout(Some(Duration::from_secs(dbconfig.pool.recycle_seconds)))
            .build()
            .map_err(|e| MigrateError::Database(format!("db 풀 생성 실패: {e}")))?;

        let pool = Self {
            pool: Arc::new(pool),
        };

        // 간단한 쿼리로 연결 확인
        pool.probe_connection().await?;

        info!(
            "db 풀 초기화 완료: {}:{}/{} (최대 연결 수: {})",
            conn.host, conn.port, conn.database, dbconfig.pool.max_connections
        );

        Ok(pool)
    }

    /// 연결 풀에서 연결 가져오기. 반환은 드랍 시 자동
    pub async fn get(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::Database(format!("연결 풀에서 연결 가져오기 실패: {e}")))
    }

    /// 풀 생성 직후 연결 상태 확인
    async fn probe_connection(&self) -> Result<()> {
        let conn = self.get().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| MigrateError::Database(format!("데이터베이스 연결 확인 실패: {e}")))?;
        Ok(())
    }
}

/// 데이터베이스 풀 초기화 함수
pub async fn initialize_dbpool(config: &DbConfig) -> Result<DatabasePool> {
    DatabasePool::new(config).await
}
