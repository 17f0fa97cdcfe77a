//! Device location: permission check followed by a one-shot position fix.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{WeatherError, WeatherResult};
use crate::types::Coordinate;

/// Outcome of a foreground location permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Platform positioning service.
#[async_trait]
pub trait PositionService: Send + Sync {
    /// Ask for foreground location access.
    async fn request_permission(&self) -> Permission;

    /// One-shot fix. Only called after permission was granted.
    async fn current_position(&self) -> WeatherResult<Coordinate>;
}

/// Positioning service backed by configuration values.
#[derive(Debug, Clone)]
pub struct ConfiguredPosition {
    permission_granted: bool,
    fix: Option<Coordinate>,
}

impl ConfiguredPosition {
    pub fn new(permission_granted: bool, fix: Option<Coordinate>) -> Self {
        Self {
            permission_granted,
            fix,
        }
    }
}

#[async_trait]
impl PositionService for ConfiguredPosition {
    async fn request_permission(&self) -> Permission {
        if self.permission_granted {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn current_position(&self) -> WeatherResult<Coordinate> {
        self.fix.ok_or_else(|| {
            WeatherError::PositionUnavailable("no position fix configured".to_string())
        })
    }
}

/// Resolves the device's current coordinate.
#[derive(Clone)]
pub struct LocationResolver {
    service: Arc<dyn PositionService>,
}

impl LocationResolver {
    pub fn new(service: Arc<dyn PositionService>) -> Self {
        Self { service }
    }

    /// Request permission, then a single fix. No retry and no caching.
    ///
    /// # Errors
    /// `PermissionDenied` if access is refused, `PositionUnavailable` if no
    /// valid fix can be produced.
    pub async fn resolve_current_location(&self) -> WeatherResult<Coordinate> {
        if self.service.request_permission().await == Permission::Denied {
            tracing::error!("Error getting location: permission denied");
            return Err(WeatherError::PermissionDenied);
        }

        let coordinate = match self.service.current_position().await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Error getting location: {}", e);
                return Err(e);
            }
        };

        if !coordinate.is_valid() {
            tracing::error!(
                "Error getting location: fix out of range ({}, {})",
                coordinate.latitude,
                coordinate.longitude
            );
            return Err(WeatherError::PositionUnavailable(format!(
                "fix out of range: {}, {}",
                coordinate.latitude, coordinate.longitude
            )));
        }

        tracing::info!(
            "Got location: {}, {}",
            coordinate.latitude,
            coordinate.longitude
        );
        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(granted: bool, fix: Option<Coordinate>) -> LocationResolver {
        LocationResolver::new(Arc::new(ConfiguredPosition::new(granted, fix)))
    }

    #[tokio::test]
    async fn test_granted_with_fix() {
        let coordinate = resolver(true, Some(Coordinate::new(51.5, -0.12)))
            .resolve_current_location()
            .await
            .unwrap();
        assert_eq!(coordinate, Coordinate::new(51.5, -0.12));
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let result = resolver(false, Some(Coordinate::new(51.5, -0.12)))
            .resolve_current_location()
            .await;
        assert!(matches!(result, Err(WeatherError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_no_fix_is_unavailable() {
        let result = resolver(true, None).resolve_current_location().await;
        assert!(matches!(result, Err(WeatherError::PositionUnavailable(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_fix_is_unavailable() {
        let result = resolver(true, Some(Coordinate::new(123.0, 0.0)))
            .resolve_current_location()
            .await;
        assert!(matches!(result, Err(WeatherError::PositionUnavailable(_))));
    }
}
