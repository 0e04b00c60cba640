use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use time::{Date, OffsetDateTime};

use crate::config::AppConfig;
use crate::meals::{MealGateway, PgMealGateway};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn MealGateway>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env().context("loading configuration")?);

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connecting to postgres")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("running migrations")?;

        let gateway = Arc::new(PgMealGateway::new(db)) as Arc<dyn MealGateway>;
        Ok(Self::from_parts(config, gateway))
    }

    pub fn from_parts(config: Arc<AppConfig>, gateway: Arc<dyn MealGateway>) -> Self {
        Self { config, gateway }
    }

    /// Current instant in the configured offset.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.config.utc_offset)
    }

    pub fn today(&self) -> Date {
        self.now().date()
    }
}
