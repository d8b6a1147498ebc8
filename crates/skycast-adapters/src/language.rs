//! Language adapter -- lets the model read or switch a user's reply language.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use skycast_agent::{ToolAdapter, ToolDefinition};
use skycast_lang::{LanguageService, LanguageSource};
use tracing::info;

use crate::error::{AdapterError, Result};

const TOOL_NAME: &str = "language";

/// Tool output returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageToolOutput {
    pub lang: String,
    pub source: LanguageSource,
    pub system_prompt: String,
    pub supported: Vec<String>,
}

/// Exposes a shared [`LanguageService`] as the `language` tool.
#[derive(Clone)]
pub struct LanguageAdapter {
    service: LanguageService,
}

impl LanguageAdapter {
    pub fn new(service: LanguageService) -> Self {
        Self { service }
    }

    async fn tool_language(&self, params: Value) -> Result<Value> {
        let user_id = params
            .get("userId")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AdapterError::InvalidParams {
                tool_name: TOOL_NAME.into(),
                reason: "missing required string field `userId`".into(),
            })?;
        let target = non_empty_str(&params, "targetLang");
        let sample = non_empty_str(&params, "sampleText");

        let resolution = match target {
            Some(lang) => {
                let forced = self.service.force_language(user_id, lang).await?;
                info!(user_id, lang = %forced.lang, "language switched by tool");
                forced
            }
            None => self.service.ensure_language(user_id, sample).await,
        };

        let output = LanguageToolOutput {
            system_prompt: format!("Respond ONLY in {}.", resolution.lang),
            lang: resolution.lang,
            source: resolution.source,
            supported: self.service.list_supported().to_vec(),
        };
        Ok(serde_json::to_value(output)?)
    }
}

fn non_empty_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl ToolAdapter for LanguageAdapter {
    fn adapter_id(&self) -> &str {
        "language"
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: TOOL_NAME.into(),
            description: "Ensure or switch the user's preferred language. Provide targetLang to force a change or sampleText to auto-detect.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "userId": { "type": "string" },
                    "targetLang": {
                        "type": "string",
                        "description": "Language code to switch to",
                        "enum": self.service.list_supported()
                    },
                    "sampleText": {
                        "type": "string",
                        "description": "Recent user text used for detection"
                    }
                },
                "required": ["userId"]
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
        Ok(self.tool_language(arguments).await?)
    }
}
