use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default forecast horizon in days
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Wind speed unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    #[default]
    Kmh,
    Mph,
}

/// Pressure unit preference. Both read the same millibar value; only the label differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    #[default]
    Mbar,
    Hpa,
}

macro_rules! unit_keys {
    ($ty:ty { $($variant:ident => $key:literal),+ $(,)? }) => {
        impl $ty {
            /// Value stored under the preference key
            pub fn as_key(&self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }

            /// Parse a stored preference value
            pub fn from_key(value: &str) -> Option<Self> {
                match value.trim() {
                    $($key => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

unit_keys!(TemperatureUnit { Celsius => "celsius", Fahrenheit => "fahrenheit" });
unit_keys!(SpeedUnit { Kmh => "kmh", Mph => "mph" });
unit_keys!(PressureUnit { Mbar => "mbar", Hpa => "hpa" });

/// A numeric value with its display suffix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub suffix: &'static str,
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}{}", self.value, self.suffix)
    }
}

/// Weather condition categories mapped from the provider's condition text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Clear,
    PartlyCloudy,
    Cloudy,
    Overcast,
    PatchyRain,
    LightRain,
    ModerateRain,
    HeavyRain,
    LightSnow,
    #[default]
    Other,
}

impl WeatherCondition {
    /// Categorise a provider condition text such as "Partly cloudy"
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "sunny" => Self::Sunny,
            "clear" => Self::Clear,
            "partly cloudy" => Self::PartlyCloudy,
            "cloudy" => Self::Cloudy,
            "overcast" => Self::Overcast,
            "patchy rain nearby" => Self::PatchyRain,
            "light rain" => Self::LightRain,
            "moderate rain" | "moderate rain at times" | "patchy rain possible" => {
                Self::ModerateRain
            }
            "heavy rain"
            | "heavy rain at times"
            | "moderate or heavy freezing rain"
            | "moderate or heavy rain shower"
            | "moderate or heavy rain with thunder" => Self::HeavyRain,
            "light snow" => Self::LightSnow,
            _ => Self::Other,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Overcast => "Overcast",
            Self::PatchyRain => "Patchy Rain",
            Self::LightRain => "Light Rain",
            Self::ModerateRain => "Moderate Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::LightSnow => "Light Snow",
            Self::Other => "Other",
        }
    }

    /// Get the image asset name used by the presentation layer
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::Clear => "clear",
            Self::PartlyCloudy => "partlycloudy",
            Self::Cloudy => "cloudy",
            Self::Overcast => "mist",
            Self::PatchyRain => "weather",
            Self::LightRain => "light-rain",
            Self::ModerateRain | Self::Other => "moderaterain",
            Self::HeavyRain => "heavyrain",
            Self::LightSnow => "snow",
        }
    }
}

/// Geographic coordinate from the positioning service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// What a forecast is requested for
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    City(String),
    Coordinates(Coordinate),
}

/// A forecast request: one target plus the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub target: QueryTarget,
    pub days: u32,
}

impl ForecastQuery {
    pub fn city(name: impl Into<String>, days: u32) -> Self {
        Self {
            target: QueryTarget::City(name.into()),
            days,
        }
    }

    pub fn coordinates(coordinate: Coordinate, days: u32) -> Self {
        Self {
            target: QueryTarget::Coordinates(coordinate),
            days,
        }
    }

    /// The `q` parameter: the city text, or "lat,lon"
    pub fn target_text(&self) -> String {
        match &self.target {
            QueryTarget::City(name) => name.clone(),
            QueryTarget::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
        }
    }

    pub fn is_city(&self) -> bool {
        matches!(self.target, QueryTarget::City(_))
    }
}

/// A place-search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

impl LocationCandidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// "Name, Country", or just the name when the country is missing
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Parsed forecast response, kept verbatim.
///
/// Accessors read well-known fields and return `None` when a field is missing
/// or has an unexpected type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastResult(Value);

impl ForecastResult {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    fn str_at(&self, pointer: &str) -> Option<&str> {
        self.0.pointer(pointer).and_then(Value::as_str)
    }

    fn f64_at(&self, pointer: &str) -> Option<f64> {
        self.0.pointer(pointer).and_then(Value::as_f64)
    }

    pub fn location_name(&self) -> Option<&str> {
        self.str_at("/location/name")
    }

    pub fn country(&self) -> Option<&str> {
        self.str_at("/location/country")
    }

    pub fn condition_text(&self) -> Option<&str> {
        self.str_at("/current/condition/text")
    }

    pub fn condition(&self) -> WeatherCondition {
        self.condition_text()
            .map(WeatherCondition::from_text)
            .unwrap_or_default()
    }

    pub fn temperature(&self, unit: TemperatureUnit) -> Option<Reading> {
        match unit {
            TemperatureUnit::Celsius => self.f64_at("/current/temp_c").map(celsius),
            TemperatureUnit::Fahrenheit => self.f64_at("/current/temp_f").map(fahrenheit),
        }
    }

    pub fn wind_speed(&self, unit: SpeedUnit) -> Option<Reading> {
        match unit {
            SpeedUnit::Kmh => self.f64_at("/current/wind_kph").map(|value| Reading {
                value,
                suffix: " km/h",
            }),
            SpeedUnit::Mph => self.f64_at("/current/wind_mph").map(|value| Reading {
                value,
                suffix: " mph",
            }),
        }
    }

    pub fn pressure(&self, unit: PressureUnit) -> Option<Reading> {
        let suffix = match unit {
            PressureUnit::Mbar => " mbar",
            PressureUnit::Hpa => " hPa",
        };
        self.f64_at("/current/pressure_mb")
            .map(|value| Reading { value, suffix })
    }

    pub fn humidity(&self) -> Option<u8> {
        self.f64_at("/current/humidity")
            .map(|h| h.clamp(0.0, 100.0).round() as u8)
    }

    /// Daily entries in provider order
    pub fn days(&self) -> Vec<ForecastDay> {
        self.0
            .pointer("/forecast/forecastday")
            .and_then(Value::as_array)
            .map(|days| days.iter().map(ForecastDay::from_json).collect())
            .unwrap_or_default()
    }
}

fn celsius(value: f64) -> Reading {
    Reading {
        value,
        suffix: "°C",
    }
}

fn fahrenheit(value: f64) -> Reading {
    Reading {
        value,
        suffix: "°F",
    }
}

/// Daily forecast entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastDay {
    pub date: Option<NaiveDate>,
    pub avg_temp_c: Option<f64>,
    pub avg_temp_f: Option<f64>,
    pub condition_text: Option<String>,
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
}

impl ForecastDay {
    fn from_json(day: &Value) -> Self {
        let text = |pointer: &str| day.pointer(pointer).and_then(Value::as_str);
        let number = |pointer: &str| day.pointer(pointer).and_then(Value::as_f64);

        Self {
            date: text("/date").and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            avg_temp_c: number("/day/avgtemp_c"),
            avg_temp_f: number("/day/avgtemp_f"),
            condition_text: text("/day/condition/text").map(str::to_string),
            sunrise: text("/astro/sunrise").and_then(parse_clock),
            sunset: text("/astro/sunset").and_then(parse_clock),
        }
    }

    pub fn avg_temperature(&self, unit: TemperatureUnit) -> Option<Reading> {
        match unit {
            TemperatureUnit::Celsius => self.avg_temp_c.map(celsius),
            TemperatureUnit::Fahrenheit => self.avg_temp_f.map(fahrenheit),
        }
    }

    pub fn condition(&self) -> WeatherCondition {
        self.condition_text
            .as_deref()
            .map(WeatherCondition::from_text)
            .unwrap_or_default()
    }

    /// Full weekday name, e.g. "Monday"
    pub fn weekday(&self) -> Option<String> {
        self.date.map(|d| d.format("%A").to_string())
    }
}

/// Parse provider clock strings such as "05:12 AM"
fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%I:%M %p").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ForecastResult {
        ForecastResult::new(json!({
            "location": {"name": "London", "country": "United Kingdom"},
            "current": {
                "temp_c": 14.2, "temp_f": 57.6,
                "condition": {"text": "Partly cloudy"},
                "wind_kph": 19.1, "wind_mph": 11.9,
                "pressure_mb": 1012.0,
                "humidity": 72
            },
            "forecast": {"forecastday": [
                {
                    "date": "2024-05-06",
                    "day": {"avgtemp_c": 13.0, "avgtemp_f": 55.4, "condition": {"text": "Light rain"}},
                    "astro": {"sunrise": "05:12 AM", "sunset": "08:31 PM"}
                },
                {
                    "date": "2024-05-07",
                    "day": {"avgtemp_c": 15.5, "condition": {"text": "Sunny"}},
                    "astro": {}
                }
            ]}
        }))
    }

    #[test]
    fn test_condition_from_text() {
        assert_eq!(WeatherCondition::from_text("Sunny"), WeatherCondition::Sunny);
        assert_eq!(WeatherCondition::from_text("Partly cloudy"), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_text("partly cloudy "), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_text("Overcast"), WeatherCondition::Overcast);
    }

    #[test]
    fn test_condition_rain_variants() {
        assert_eq!(
            WeatherCondition::from_text("Patchy rain possible"),
            WeatherCondition::ModerateRain
        );
        assert_eq!(
            WeatherCondition::from_text("Moderate or heavy rain with thunder"),
            WeatherCondition::HeavyRain
        );
        assert_eq!(WeatherCondition::from_text("Patchy rain nearby"), WeatherCondition::PatchyRain);
    }

    #[test]
    fn test_unknown_condition_is_other() {
        assert_eq!(WeatherCondition::from_text("Blizzard"), WeatherCondition::Other);
        assert_eq!(WeatherCondition::Other.icon_name(), "moderaterain");
    }

    #[test]
    fn test_condition_icon_name() {
        assert_eq!(WeatherCondition::Sunny.icon_name(), "sun");
        assert_eq!(WeatherCondition::Overcast.icon_name(), "mist");
        assert_eq!(WeatherCondition::LightSnow.icon_name(), "snow");
    }

    #[test]
    fn test_city_target_text() {
        let query = ForecastQuery::city("Paris", 7);
        assert_eq!(query.target_text(), "Paris");
        assert!(query.is_city());
    }

    #[test]
    fn test_coordinate_target_text() {
        let query = ForecastQuery::coordinates(Coordinate::new(51.5, -0.12), 7);
        assert_eq!(query.target_text(), "51.5,-0.12");
        assert!(!query.is_city());
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(51.5, -0.12).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_unit_keys() {
        assert_eq!(TemperatureUnit::from_key("fahrenheit"), Some(TemperatureUnit::Fahrenheit));
        assert_eq!(SpeedUnit::Mph.as_key(), "mph");
        assert_eq!(PressureUnit::from_key("hpa"), Some(PressureUnit::Hpa));
        assert_eq!(PressureUnit::from_key("psi"), None);
    }

    #[test]
    fn test_current_readings() {
        let result = sample();
        assert_eq!(result.location_name(), Some("London"));
        assert_eq!(result.country(), Some("United Kingdom"));
        assert_eq!(result.condition(), WeatherCondition::PartlyCloudy);
        assert_eq!(
            result.temperature(TemperatureUnit::Celsius).map(|r| r.to_string()),
            Some("14°C".to_string())
        );
        assert_eq!(
            result.temperature(TemperatureUnit::Fahrenheit).map(|r| r.to_string()),
            Some("58°F".to_string())
        );
        assert_eq!(
            result.wind_speed(SpeedUnit::Mph).map(|r| r.to_string()),
            Some("12 mph".to_string())
        );
        assert_eq!(
            result.pressure(PressureUnit::Hpa).map(|r| r.to_string()),
            Some("1012 hPa".to_string())
        );
        assert_eq!(result.humidity(), Some(72));
    }

    #[test]
    fn test_forecast_days() {
        let days = sample().days();
        assert_eq!(days.len(), 2);

        let first = &days[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 5, 6));
        assert_eq!(first.weekday().as_deref(), Some("Monday"));
        assert_eq!(first.condition(), WeatherCondition::LightRain);
        assert_eq!(first.sunrise, NaiveTime::from_hms_opt(5, 12, 0));
        assert_eq!(first.sunset, NaiveTime::from_hms_opt(20, 31, 0));

        let second = &days[1];
        assert!(second.avg_temperature(TemperatureUnit::Fahrenheit).is_none());
        assert!(second.sunrise.is_none());
    }

    #[test]
    fn test_accessors_tolerate_unexpected_shape() {
        let result = ForecastResult::new(json!({"current": {"temp_c": "warm"}, "forecast": 3}));
        assert!(result.location_name().is_none());
        assert!(result.temperature(TemperatureUnit::Celsius).is_none());
        assert!(result.days().is_empty());
        assert_eq!(result.condition(), WeatherCondition::Other);
    }

    #[test]
    fn test_candidate_defaults_missing_fields() {
        let candidate: LocationCandidate =
            serde_json::from_value(json!({"name": "Lonely Town"})).unwrap();
        assert_eq!(candidate.id, 0);
        assert_eq!(candidate.display_name(), "Lonely Town");
    }
}
