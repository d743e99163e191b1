use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::vision::engine::{FaceEngine, HttpFaceEngine};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub vision: Arc<dyn FaceEngine>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connect to database")?;

        let vision =
            Arc::new(HttpFaceEngine::new(&config.face_engine_url)) as Arc<dyn FaceEngine>;

        Ok(Self { db, config, vision })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        vision: Arc<dyn FaceEngine>,
    ) -> Self {
        Self { db, config, vision }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::JwtConfig;
    use crate::vision::engine::{Face, FaceEngine};
    use async_trait::async_trait;
    use bytes::Bytes;

    /// Engine stub that reports one centered face with two landmarks.
    pub struct StubEngine;

    #[async_trait]
    impl FaceEngine for StubEngine {
        async fn detect(&self, _image: Bytes) -> anyhow::Result<Vec<Face>> {
            Ok(vec![Face {
                bbox: crate::vision::engine::BoundingBox {
                    x: 0.25,
                    y: 0.25,
                    width: 0.5,
                    height: 0.5,
                },
                landmarks: vec![
                    crate::vision::engine::Landmark { x: 0.3, y: 0.4 },
                    crate::vision::engine::Landmark { x: 0.7, y: 0.4 },
                ],
            }])
        }
    }

    /// Engine stub that always fails, for the generic-500 path.
    pub struct FailingEngine;

    #[async_trait]
    impl FaceEngine for FailingEngine {
        async fn detect(&self, _image: Bytes) -> anyhow::Result<Vec<Face>> {
            anyhow::bail!("detector unavailable")
        }
    }

    pub fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 20,
            },
            face_engine_url: "http://fake.local".into(),
        })
    }

    /// Fresh migrated in-memory database plus stub collaborators.
    ///
    /// A single pooled connection that never expires, so the in-memory
    /// database survives for the whole test.
    pub async fn test_state() -> AppState {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");
        AppState::from_parts(db, test_config(), Arc::new(StubEngine))
    }
}
