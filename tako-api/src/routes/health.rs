/// Health check endpoints
///
/// # Endpoints
///
/// ```text
/// GET /        -> {"service": "tako-tasks", "status": "ok"}
/// GET /health  -> {"status": "healthy", "version": "0.1.0", "database": "connected",
///                   "migrations": "up_to_date", "pool": {"active": 1, "idle": 4, "total": 5}}
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tako_shared::db;
use tracing::warn;

/// Service banner
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub service: String,
    pub status: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status (`healthy` or `degraded`)
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status (`connected` or `disconnected`)
    pub database: String,

    /// Schema state (`up_to_date`, `pending` or `unknown`)
    pub migrations: String,

    /// Connection pool utilisation
    pub pool: PoolUsage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolUsage {
    pub active: usize,
    pub idle: usize,
    pub total: usize,
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "tako-tasks".to_string(),
        status: "ok".to_string(),
    })
}

/// Health check handler
///
/// Always answers 200. An unreachable database or unapplied migrations show
/// up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = db::pool::health_check(&state.db).await.is_ok();

    let migrations = if connected {
        match db::migrations::get_migration_status(&state.db).await {
            Ok(status) if status.is_up_to_date() => "up_to_date",
            Ok(status) => {
                warn!(pending = status.pending_migrations, "Database schema is behind");
                "pending"
            }
            Err(e) => {
                warn!(error = %e, "Failed to read migration status");
                "unknown"
            }
        }
    } else {
        "unknown"
    };

    let stats = db::pool::get_pool_stats(&state.db);
    let healthy = connected && migrations == "up_to_date";

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        migrations: migrations.to_string(),
        pool: PoolUsage {
            active: stats.active_connections,
            idle: stats.idle_connections,
            total: stats.total_connections,
        },
    }))
}
