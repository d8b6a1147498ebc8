//! Weather adapter -- current conditions for a named place via Open-Meteo.
//!
//! A lookup is two requests: the geocoding API resolves the place name to
//! coordinates, then the forecast API returns the `current` block for them.
//! Neither endpoint needs an API key.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use skycast_agent::{ToolAdapter, ToolDefinition};
use tracing::{debug, info};
use url::Url;

use crate::error::{AdapterError, Result};

const TOOL_NAME: &str = "weather";

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,wind_gusts_10m,weather_code";

const REQUEST_TIMEOUT_SECS: u64 = 15;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    wind_gusts_10m: f64,
    weather_code: i64,
}

/// Tool output returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub conditions: String,
    pub location: String,
}

impl WeatherReport {
    fn from_current(current: CurrentConditions, location: String) -> Self {
        Self {
            temperature: current.temperature_2m,
            feels_like: current.apparent_temperature,
            humidity: current.relative_humidity_2m,
            wind_speed: current.wind_speed_10m,
            wind_gust: current.wind_gusts_10m,
            conditions: describe_weather_code(current.weather_code).to_owned(),
            location,
        }
    }
}

/// Text for a WMO weather interpretation code.
pub fn describe_weather_code(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Open-Meteo weather lookup exposed as the `weather` tool.
pub struct WeatherAdapter {
    client: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
}

impl WeatherAdapter {
    /// Adapter against the public Open-Meteo endpoints.
    pub fn new() -> Self {
        Self::build(DEFAULT_GEOCODING_URL.into(), DEFAULT_FORECAST_URL.into())
    }

    /// Adapter against custom endpoints (self-hosted Open-Meteo, tests).
    pub fn with_endpoints(geocoding_url: &str, forecast_url: &str) -> Result<Self> {
        Ok(Self::build(
            parse_endpoint(geocoding_url)?.into(),
            parse_endpoint(forecast_url)?.into(),
        ))
    }

    fn build(geocoding_url: String, forecast_url: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("skycast/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            geocoding_url,
            forecast_url,
        }
    }

    async fn tool_weather(&self, params: Value) -> Result<Value> {
        let location = params
            .get("location")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: TOOL_NAME.into(),
                reason: "missing required string field `location`".into(),
            })?;

        let report = self.current_weather(location).await?;
        info!(location = %report.location, conditions = %report.conditions, "weather fetched");
        Ok(serde_json::to_value(report)?)
    }

    /// Geocode `location` and fetch its current conditions.
    pub async fn current_weather(&self, location: &str) -> Result<WeatherReport> {
        debug!(location, "geocoding location");
        let geocoding: GeocodingResponse = self
            .get_json(
                &self.geocoding_url,
                &[("name", location.to_owned()), ("count", "1".to_owned())],
            )
            .await?;

        let place = geocoding
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::LocationNotFound(location.to_owned()))?;

        debug!(
            name = %place.name,
            lat = place.latitude,
            lon = place.longitude,
            "fetching forecast"
        );
        let forecast: ForecastResponse = self
            .get_json(
                &self.forecast_url,
                &[
                    ("latitude", place.latitude.to_string()),
                    ("longitude", place.longitude.to_string()),
                    ("current", CURRENT_FIELDS.to_owned()),
                ],
            )
            .await?;

        Ok(WeatherReport::from_current(forecast.current, place.name))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(endpoint)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Timeout {
                        seconds: REQUEST_TIMEOUT_SECS,
                        reason: format!("request to `{endpoint}` timed out"),
                    }
                } else {
                    AdapterError::ExecutionFailed {
                        tool_name: TOOL_NAME.into(),
                        reason: format!("request to `{endpoint}` failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: format!("`{endpoint}` returned HTTP {}", status.as_u16()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AdapterError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: format!("unexpected response from `{endpoint}`: {e}"),
            })
    }
}

impl Default for WeatherAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| AdapterError::ConfigError(format!("invalid endpoint `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AdapterError::ConfigError(format!(
            "endpoint `{raw}` must be http(s), got `{other}`"
        ))),
    }
}

#[async_trait]
impl ToolAdapter for WeatherAdapter {
    fn adapter_id(&self) -> &str {
        "open-meteo"
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_NAME.into(),
            description: "Get current weather for a location".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "City name"
                    }
                },
                "required": ["location"]
            }),
        }]
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> skycast_agent::Result<Value> {
        if tool_name != TOOL_NAME {
            return Err(AdapterError::ToolNotFound {
                adapter_id: self.adapter_id().into(),
                tool_name: tool_name.into(),
            }
            .into());
        }
        Ok(self.tool_weather(arguments).await?)
    }
}
