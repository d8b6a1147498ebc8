//! System instructions for the weather assistant.

use std::path::Path;

use chrono::{DateTime, Utc};

/// Built-in prompt used when no instructions file is present.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are a helpful weather assistant that provides accurate weather information and can help planning activities based on the weather.

Your primary function is to help users get weather details for specific locations. When responding:
- Always ask for a location if none is provided
- If the location name isn't in English, please translate it
- If giving a location with multiple parts (e.g. \"New York, NY\"), use the most relevant part (e.g. \"New York\")
- Include relevant details like humidity, wind conditions, and precipitation
- Keep responses concise but informative
- If the user asks for activities and provides the weather forecast, suggest activities based on the weather forecast.
- If the user asks for activities, respond in the format they request.

Use the weather tool to fetch current weather data. When the user asks to switch language, call the language tool with targetLang.";

/// Read instructions from `path`, falling back to [`DEFAULT_INSTRUCTIONS`]
/// when the file is missing, unreadable, or blank.
pub fn load_instructions(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => {
            tracing::info!(path = %path.display(), "loaded agent instructions");
            text.trim().to_owned()
        }
        Ok(_) => DEFAULT_INSTRUCTIONS.to_owned(),
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "using built-in agent instructions"
            );
            DEFAULT_INSTRUCTIONS.to_owned()
        }
    }
}

/// Append the current date and time so the model can reason about "today".
pub fn with_timestamp(instructions: &str, now: DateTime<Utc>) -> String {
    format!(
        "{instructions}\n\nCurrent date and time: {} (UTC).",
        now.format("%A, %Y-%m-%d %H:%M")
    )
}
