use std::io::Write;

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, error, info};

use udss_migrate_config::Settings;
use udss_migrate_db::{cleanup_db, initialize_dbpool};
use udss_migrate_engine::Migrator;
use udss_migrate_error::{MigrateError, Result};
use udss_migrate_es::EsClient;

/// 검색 인덱스 데이터를 PostgreSQL 로 이관하는 도구
#[derive(Parser, Debug)]
#[command(name = "umigrate", about = "검색 인덱스 → PostgreSQL 마이그레이션")]
struct Cli {
    /// 소스 엔드포인트 host[:port]
    source: Option<String>,

    /// 마이그레이션 대신 싱크 스키마 제거 후 재생성
    #[arg(short = 'c', long = "cleanup")]
    cleanup: bool,
}

/// 로거 세팅
fn setup_logger() {
    #[cfg(debug_assertions)]
    {
        Builder::new()
            .filter(None, LevelFilter::Debug)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {} {}:{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.file().unwrap_or("unknown"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init()
    }

    #[cfg(not(debug_assertions))]
    {
        Builder::new()
            .filter(None, LevelFilter::Info)
            .init();
    }
}

/// host[:port] 인자 분해. 포트가 없으면 기본 포트 사용
fn parse_endpoint(raw: &str, default_port: u16) -> Result<(String, u16)> {
    match raw.split_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                return Err(MigrateError::Config(format!(
                    "소스 엔드포인트에 호스트 없음: '{raw}'"
                )));
            }
            let port = port
                .parse::<u16>()
                .map_err(|e| MigrateError::Config(format!("포트 파싱 실패 '{port}': {e}")))?;
            Ok((host.to_string(), port))
        }
        None => Ok((raw.to_string(), default_port)),
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // 통합 설정 로드
    let settings = Settings::new()?;

    // db 풀 준비
    let pool = initialize_dbpool(&settings.database).await?;

    // 클린업 경로: 싱크 스키마를 지우고 종료
    if cli.cleanup {
        return cleanup_db(&pool).await;
    }

    let Some(source) = cli.source else {
        return Err(MigrateError::Config(
            "소스 엔드포인트 인자 필요: umigrate <host[:port]>".to_string(),
        ));
    };
    let (host, port) = parse_endpoint(&source, settings.migrate.source_port)?;
    info!("소스 엔드포인트: {host}:{port}");

    let client = EsClient::new(&host, port, settings.migrate.search_timeout_seconds);
    let migrator = Migrator::new(pool, client, &settings);

    migrator.run().await
}

#[tokio::main]
async fn main() {
    setup_logger();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}
