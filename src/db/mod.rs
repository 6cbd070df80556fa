use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{hackers, scans};
use crate::seed::SeedHacker;

pub mod migrator;
pub mod repositories;

pub use repositories::hacker::HackerPatch;
pub use repositories::scan::CategoryFrequency;

/// A hacker row paired with the scans reachable through its badge code.
pub type HackerWithScans = (hackers::Model, Vec<scans::Model>);

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn hacker_repo(&self) -> repositories::hacker::HackerRepository {
        repositories::hacker::HackerRepository::new(self.conn.clone())
    }

    fn scan_repo(&self) -> repositories::scan::ScanRepository {
        repositories::scan::ScanRepository::new(self.conn.clone())
    }

    pub async fn replace_all(&self, fixture: &[SeedHacker]) -> Result<()> {
        self.hacker_repo().replace_all(fixture).await
    }

    pub async fn list_hackers(&self) -> Result<Vec<HackerWithScans>> {
        self.hacker_repo().list_with_scans().await
    }

    pub async fn get_hacker(&self, id: i32) -> Result<Option<HackerWithScans>> {
        self.hacker_repo().get_with_scans(id).await
    }

    pub async fn update_hacker(
        &self,
        id: i32,
        patch: HackerPatch,
    ) -> Result<Option<HackerWithScans>> {
        self.hacker_repo().update(id, patch).await
    }

    pub async fn record_scan(
        &self,
        badge_code: &str,
        activity_name: &str,
        activity_category: &str,
    ) -> Result<Option<scans::Model>> {
        self.scan_repo()
            .record(badge_code, activity_name, activity_category)
            .await
    }

    pub async fn aggregate_scans(
        &self,
        category: Option<&str>,
        min_frequency: Option<i64>,
        max_frequency: Option<i64>,
    ) -> Result<Vec<CategoryFrequency>> {
        self.scan_repo()
            .aggregate(category, min_frequency, max_frequency)
            .await
    }
}
