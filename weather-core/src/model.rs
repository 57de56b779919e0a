use serde::{Deserialize, Serialize};

/// Description returned when the provider reports no weather entries.
pub const NO_DESCRIPTION: &str = "No description available";

/// An incoming weather request, as received at the boundary.
#[derive(Debug, Clone)]
pub struct WeatherQuery {
    pub city: String,
    pub country: Option<String>,
    pub api_key: Option<String>,
}

impl WeatherQuery {
    pub fn new(city: impl Into<String>, country: Option<String>, api_key: Option<String>) -> Self {
        Self {
            city: city.into(),
            country: normalize_country(country.as_deref()),
            api_key,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.city, self.country.as_deref())
    }
}

/// Identity of a cached record: the exact (city, country) pair.
///
/// An empty country and an absent one are the same key. Stores that keep
/// `NULL` and `''` as distinct rows would hold two records for such a city;
/// here both resolve to one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub city: String,
    pub country: Option<String>,
}

impl RecordKey {
    pub fn new(city: &str, country: Option<&str>) -> Self {
        Self {
            city: city.to_string(),
            country: normalize_country(country),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{},{}", self.city, country),
            None => f.write_str(&self.city),
        }
    }
}

/// A persisted weather description for one (city, country) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub description: String,
}

impl WeatherRecord {
    pub fn new(key: RecordKey, description: impl Into<String>) -> Self {
        Self {
            city: key.city,
            country: key.country,
            description: description.into(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.city, self.country.as_deref())
    }
}

/// The subset of the provider payload this proxy reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamWeather {
    #[serde(default)]
    pub weather: Vec<UpstreamCondition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCondition {
    pub description: String,
}

impl UpstreamWeather {
    /// First reported description, or the fixed placeholder when there is none.
    pub fn description(&self) -> String {
        self.weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string())
    }
}

fn normalize_country(country: Option<&str>) -> Option<String> {
    country.filter(|c| !c.is_empty()).map(str::to_string)
}
