//! Display-unit preferences persisted in the key-value store.

use serde::{Deserialize, Serialize};

use crate::error::{WeatherError, WeatherResult};
use crate::store::KeyValueStore;
use crate::types::{PressureUnit, SpeedUnit, TemperatureUnit};

pub const TEMP_UNIT_KEY: &str = "tempUnit";
pub const SPEED_UNIT_KEY: &str = "speedUnit";
pub const PRESSURE_UNIT_KEY: &str = "pressureUnit";
pub const UPDATE_AUTOMATICALLY_KEY: &str = "updateAutomatically";

/// User display preferences.
///
/// `update_automatically` is persisted only; nothing schedules refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub temperature_unit: TemperatureUnit,
    pub speed_unit: SpeedUnit,
    pub pressure_unit: PressureUnit,
    pub update_automatically: bool,
}

impl Preferences {
    /// Read all preferences, using defaults for absent or unrecognised values.
    ///
    /// # Errors
    /// Returns `WeatherError::StoreUnavailable` if the store cannot be read.
    pub async fn load(store: &KeyValueStore) -> WeatherResult<Self> {
        let mut prefs = Self::default();

        if let Some(value) = store.get(TEMP_UNIT_KEY).await? {
            match TemperatureUnit::from_key(&value) {
                Some(unit) => prefs.temperature_unit = unit,
                None => tracing::warn!("Ignoring unknown {} value: {}", TEMP_UNIT_KEY, value),
            }
        }

        if let Some(value) = store.get(SPEED_UNIT_KEY).await? {
            match SpeedUnit::from_key(&value) {
                Some(unit) => prefs.speed_unit = unit,
                None => tracing::warn!("Ignoring unknown {} value: {}", SPEED_UNIT_KEY, value),
            }
        }

        if let Some(value) = store.get(PRESSURE_UNIT_KEY).await? {
            match PressureUnit::from_key(&value) {
                Some(unit) => prefs.pressure_unit = unit,
                None => tracing::warn!("Ignoring unknown {} value: {}", PRESSURE_UNIT_KEY, value),
            }
        }

        if let Some(value) = store.get(UPDATE_AUTOMATICALLY_KEY).await? {
            match serde_json::from_str::<bool>(&value) {
                Ok(flag) => prefs.update_automatically = flag,
                Err(e) => tracing::warn!(
                    "Ignoring malformed {} value {}: {}",
                    UPDATE_AUTOMATICALLY_KEY,
                    value,
                    e
                ),
            }
        }

        Ok(prefs)
    }

    /// Write all four keys. Each write is independent; a failure leaves earlier
    /// keys written.
    ///
    /// # Errors
    /// Returns `WeatherError::StoreUnavailable` on the first failed write.
    pub async fn save(&self, store: &KeyValueStore) -> WeatherResult<()> {
        store
            .set(TEMP_UNIT_KEY, self.temperature_unit.as_key())
            .await?;
        store.set(SPEED_UNIT_KEY, self.speed_unit.as_key()).await?;
        store
            .set(PRESSURE_UNIT_KEY, self.pressure_unit.as_key())
            .await?;
        let flag = serde_json::to_string(&self.update_automatically)
            .map_err(|e| WeatherError::store_unavailable(UPDATE_AUTOMATICALLY_KEY, e))?;
        store.set(UPDATE_AUTOMATICALLY_KEY, &flag).await?;

        tracing::info!("Saved preferences: {:?}", self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_gives_defaults() {
        let store = KeyValueStore::in_memory().unwrap();
        let prefs = Preferences::load(&store).await.unwrap();

        assert_eq!(prefs.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.speed_unit, SpeedUnit::Kmh);
        assert_eq!(prefs.pressure_unit, PressureUnit::Mbar);
        assert!(!prefs.update_automatically);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = KeyValueStore::in_memory().unwrap();
        let prefs = Preferences {
            temperature_unit: TemperatureUnit::Fahrenheit,
            speed_unit: SpeedUnit::Mph,
            pressure_unit: PressureUnit::Hpa,
            update_automatically: true,
        };

        prefs.save(&store).await.unwrap();

        assert_eq!(Preferences::load(&store).await.unwrap(), prefs);
        assert_eq!(
            store.get(UPDATE_AUTOMATICALLY_KEY).await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_update_flag_stored_as_json_bool() {
        let store = KeyValueStore::in_memory().unwrap();

        Preferences::default().save(&store).await.unwrap();

        let raw = store.get(UPDATE_AUTOMATICALLY_KEY).await.unwrap().unwrap();
        assert_eq!(raw, "false");
        assert!(!serde_json::from_str::<bool>(&raw).unwrap());
    }

    #[tokio::test]
    async fn test_unrecognised_values_fall_back() {
        let store = KeyValueStore::in_memory().unwrap();
        store.set(TEMP_UNIT_KEY, "kelvin").await.unwrap();
        store.set(SPEED_UNIT_KEY, "mph").await.unwrap();
        store.set(UPDATE_AUTOMATICALLY_KEY, "yes please").await.unwrap();

        let prefs = Preferences::load(&store).await.unwrap();

        assert_eq!(prefs.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.speed_unit, SpeedUnit::Mph);
        assert!(!prefs.update_automatically);
    }
}
