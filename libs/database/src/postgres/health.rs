use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use std::time::Instant;
use tracing::debug;

use crate::error::DatabaseError;

/// Run `SELECT 1` against the pool
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_owned());
    db.query_one_raw(stmt)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;

    debug!("PostgreSQL health check passed");
    Ok(())
}

/// Outcome of a health probe, with its round-trip time
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(message: String, response_time_ms: u64) -> Self {
        Self {
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }

    /// Convert into the `Result<(), String>` shape readiness checks expect
    pub fn into_result(self) -> Result<(), String> {
        match self.message {
            None if self.healthy => Ok(()),
            message => Err(message.unwrap_or_else(|| "unhealthy".to_string())),
        }
    }
}

/// Like [`check_health`] but never fails; reports timing for readiness responses
pub async fn check_health_detailed(db: &DatabaseConnection) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(db).await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus::healthy(elapsed),
        Err(e) => HealthStatus::unhealthy(e.to_string(), elapsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_healthy_into_result() {
        let status = HealthStatus::healthy(3);
        assert!(status.healthy);
        assert!(status.into_result().is_ok());
    }

    #[test]
    fn test_health_status_unhealthy_into_result() {
        let status = HealthStatus::unhealthy("connection refused".to_string(), 100);
        assert_eq!(status.response_time_ms, 100);
        assert_eq!(status.into_result().unwrap_err(), "connection refused");
    }
}
