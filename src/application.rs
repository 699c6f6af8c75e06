//! Application lifecycle: configuration, connection pools, and the server
//! loop. Pools and the upstream client are constructed once here and passed
//! by reference into the router.

use crate::config::Settings;
use crate::proxy::{router, AppState, Forwarder, UpstreamUrl};
use crate::store::SearchStore;
use crate::{Error, Result};
use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    db_pool: PgPool,
}

impl Application {
    #[instrument]
    pub async fn new() -> Result<Self> {
        let settings = Settings::new()?;

        info!("Connecting to database at {}", settings.database.host);
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.database.max_connections)
            .connect(&settings.database_url())
            .await?;

        sqlx::migrate!("./migrations").run(&db_pool).await?;

        Ok(Self { settings, db_pool })
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        let upstream = UpstreamUrl::try_new(self.settings.upstream.base_url.clone())
            .map_err(|e| Error::InvalidConfig(format!("upstream.base_url: {e}")))?;

        let forwarder = Arc::new(Forwarder::new(upstream, self.settings.forward_timeout()));
        let store = Arc::new(SearchStore::new(self.db_pool.clone()));
        let state = AppState::new(forwarder, store);

        let app = router(state)
            .layer(self.cors_layer())
            .layer(TraceLayer::new_for_http());

        let address = format!(
            "{}:{}",
            self.settings.application.host, self.settings.application.port
        );
        info!("Starting searchtap server on {address}");

        let listener = tokio::net::TcpListener::bind(&address).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .settings
            .allowed_origins()
            .into_iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring unparseable CORS origin: {origin}");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn db_pool(&self) -> &PgPool {
        &self.db_pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database connection"]
    async fn test_application_can_be_created() {
        let app = Application::new()
            .await
            .expect("Failed to create application");
        assert!(app.settings().application.port > 0);
    }
}
