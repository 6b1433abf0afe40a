//! Weather lookup tool (canned response)

use super::{parse_input, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub fn get_weather(location: &str) -> String {
    format!("The weather in {location} is sunny.")
}

pub struct GetWeatherTool;

#[derive(Debug, Deserialize)]
struct WeatherInput {
    location: String,
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> String {
        "Get the weather for a given location. Ensure location is fully spelled out.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["location"],
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City or place name, fully spelled out"
                }
            }
        })
    }

    async fn run(&self, input: Value, _ctx: ToolContext) -> ToolOutput {
        match parse_input::<WeatherInput>(input) {
            Ok(input) => ToolOutput::success(get_weather(&input.location)),
            Err(e) => e.into(),
        }
    }
}
