use std::path::Path;

use log::info;

use udss_migrate_error::{MigrateError, Result};

use crate::config::Config;
use crate::dbconfig::DbConfig;

/// 통합 세팅 인스턴스
pub struct Settings {
    pub migrate: Config,
    pub database: DbConfig,
}

impl Settings {
    /// Setting 생성
    pub fn new() -> Result<Self> {
        let migrate = Self::load_migrate_config()?;
        let database = Self::load_db_config()?;

        Ok(Self {
            migrate,
            database,
        })
    }

    /// 마이그레이션 설정 로드
    fn load_migrate_config() -> Result<Config> {
        // yml 파일 유무 확인
        if Path::new("migrate.yml").exists() {
            info!("마이그레이션 설정파일 로드: migrate.yml");
            match Config::from_file("migrate.yml") {
                Ok(config) => Ok(config),
                Err(e) => {
                    Err(MigrateError::Config(format!("마이그레이션 설정파일 로드 실패: {}", e)))
                }
            }
        } else {
            // 기본설정사용
            info!("마이그레이션 기본설정 사용");
            Ok(Config::new())
        }
    }

    /// db 설정 로드
    fn load_db_config() -> Result<DbConfig> {
        // yml 파일 유무 확인
        if Path::new("db.yml").exists() {
            info!("DB 설정파일 로드: db.yml");
            match DbConfig::from_file("db.yml") {
                Ok(config) => Ok(config),
                Err(e) => {
                    Err(MigrateError::Config(format!("DB 설정파일 로드 실패: {}", e)))
                }
            }
        } else {
            // 기본설정사용
            info!("DB 기본설정 사용");
            Ok(DbConfig::default())
        }
    }
}
