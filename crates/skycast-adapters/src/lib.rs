//! Tools the skycast agent can call.
//!
//! - [`weather`]: current conditions for a named place via Open-Meteo.
//! - [`language`]: read or switch the user's reply language.

pub mod error;
pub mod language;
pub mod weather;

pub use error::{AdapterError, Result};
pub use language::{LanguageAdapter, LanguageToolOutput};
pub use weather::{WeatherAdapter, WeatherReport, describe_weather_code};
