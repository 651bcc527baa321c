use anyhow::Result;
use diesel::{ConnectionError, ConnectionResult};
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};
use diesel_async::AsyncPgConnection;
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::store::DbPool;

/// Builds the process-wide connection pool.
pub async fn connect(config: &Config) -> Result<DbPool> {
    let manager = if config.ssl_relaxed() {
        info!("Using TLS without certificate verification");
        let mut manager_config = ManagerConfig::<AsyncPgConnection>::default();
        manager_config.custom_setup = Box::new(establish_relaxed_tls);
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            config.connection_string(),
            manager_config,
        )
    } else {
        if config.database_ssl_relaxed {
            warn!("DATABASE_SSL_RELAXED is ignored without DATABASE_URL");
        }
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.connection_string())
    };

    let pool = bb8::Pool::builder()
        .max_size(config.pool_max_size)
        .connection_timeout(Duration::from_secs(config.pool_timeout_secs))
        .build(manager)
        .await?;
    Ok(pool)
}

fn establish_relaxed_tls(url: &str) -> BoxFuture<'_, ConnectionResult<AsyncPgConnection>> {
    let fut = async {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        let tls = postgres_native_tls::MakeTlsConnector::new(connector);

        let (client, connection) = tokio_postgres::connect(url, tls)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection error: {}", e);
            }
        });

        AsyncPgConnection::try_from(client).await
    };
    fut.boxed()
}
