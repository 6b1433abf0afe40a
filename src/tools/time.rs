//! Current time tool

use super::{parse_input, Tool, ToolContext, ToolOutput};
use crate::error::ToolError;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

/// Current instant as an RFC 3339 timestamp in the named IANA zone
pub fn current_time(timezone: &str) -> Result<String, ToolError> {
    let tz: Tz = timezone
        .trim()
        .parse()
        .map_err(|_| ToolError::InvalidTimezone(timezone.to_string()))?;
    Ok(Utc::now()
        .with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::Millis, false))
}

pub struct CurrentTimeTool;

#[derive(Debug, Deserialize)]
struct TimeInput {
    #[serde(default)]
    timezone: Option<String>,
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &'static str {
        "current_time"
    }

    fn description(&self) -> String {
        "Get the current date and time as an ISO-8601 timestamp in the given IANA timezone (defaults to UTC).".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name, e.g. \"UTC\" or \"America/New_York\""
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: TimeInput = match parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        let timezone = input
            .timezone
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or_else(|| ctx.default_timezone().to_string());

        match current_time(&timezone) {
            Ok(now) => ToolOutput::success(now),
            Err(e) => {
                tracing::warn!(session_id = %ctx.session_id, error = %e, "current_time failed");
                e.into()
            }
        }
    }
}
