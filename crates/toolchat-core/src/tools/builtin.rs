//! Built-in local tools:
//! - get_current_time: local wall-clock time
//! - get_current_weather: OpenWeather lookup by city

use super::weather::{WeatherClient, WeatherError};
use super::{InvocationError, ToolCapability, ToolDefinition, ToolRegistry};
use crate::config::WeatherConfig;
use async_trait::async_trait;
use serde_json::{Map, Value, json};

// === Tool Name Constants ===

/// Name of the built-in time tool
pub const CURRENT_TIME_TOOL_NAME: &str = "get_current_time";

/// Name of the built-in weather tool
pub const CURRENT_WEATHER_TOOL_NAME: &str = "get_current_weather";

const EMPTY_CITY_MESSAGE: &str = "错误：需要提供有效的城市名称（字符串）。";

// === Tool Definition Registry ===

/// Property definition for a tool parameter
struct ToolPropertyDef {
    name: &'static str,
    prop_type: &'static str,
    description: &'static str,
}

/// Built-in tool definition for declarative registry
struct BuiltinToolDef {
    name: &'static str,
    description: &'static str,
    properties: &'static [ToolPropertyDef],
    required: &'static [&'static str],
}

impl BuiltinToolDef {
    fn to_definition(&self) -> ToolDefinition {
        let mut props = Map::new();
        for prop in self.properties {
            props.insert(
                prop.name.to_string(),
                json!({
                    "type": prop.prop_type,
                    "description": prop.description,
                }),
            );
        }
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": props,
                "required": self.required,
            }),
        }
    }
}

static CURRENT_TIME_DEF: BuiltinToolDef = BuiltinToolDef {
    name: CURRENT_TIME_TOOL_NAME,
    description: "当你想知道现在的时间时非常有用。",
    properties: &[],
    required: &[],
};

static CURRENT_WEATHER_DEF: BuiltinToolDef = BuiltinToolDef {
    name: CURRENT_WEATHER_TOOL_NAME,
    description: "当你想查询指定城市的天气时非常有用。",
    properties: &[ToolPropertyDef {
        name: "location",
        prop_type: "string",
        description: "城市或县区，比如北京市、杭州市、深圳。(请注意API可能对中文地名支持有限，尝试拼音或英文)",
    }],
    required: &["location"],
};

/// Register both local tools, time first.
pub fn register_local_tools(
    registry: &mut ToolRegistry,
    weather: &WeatherConfig,
) -> Result<(), WeatherError> {
    registry.register(Box::new(CurrentTimeTool::new()));
    registry.register(Box::new(CurrentWeatherTool::new(WeatherClient::new(
        weather.clone(),
    )?)));
    Ok(())
}

// === Implementations ===

pub struct CurrentTimeTool {
    definition: ToolDefinition,
}

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self {
            definition: CURRENT_TIME_DEF.to_definition(),
        }
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolCapability for CurrentTimeTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(&self, _args: &Map<String, Value>) -> Result<String, InvocationError> {
        Ok(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

pub struct CurrentWeatherTool {
    definition: ToolDefinition,
    client: WeatherClient,
}

impl CurrentWeatherTool {
    pub fn new(client: WeatherClient) -> Self {
        Self {
            definition: CURRENT_WEATHER_DEF.to_definition(),
            client,
        }
    }
}

#[async_trait]
impl ToolCapability for CurrentWeatherTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<String, InvocationError> {
        // `city` is what the remote weather tool calls it; models mix them up.
        let location = args
            .get("location")
            .or_else(|| args.get("city"))
            .ok_or_else(|| InvocationError::MissingArgument("location".to_string()))?;

        match location.as_str().map(str::trim) {
            Some(city) if !city.is_empty() => Ok(self.client.current_weather(city).await),
            _ => Ok(EMPTY_CITY_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ToolArguments, ToolCallRequest};
    use crate::tools::ToolDispatcher;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn offline_weather() -> CurrentWeatherTool {
        CurrentWeatherTool::new(WeatherClient::new(WeatherConfig::default()).unwrap())
    }

    #[test]
    fn test_definitions_match_declared_schema() {
        let time = CURRENT_TIME_DEF.to_definition().to_api_format();
        assert_eq!(time["function"]["name"], "get_current_time");
        assert_eq!(time["function"]["parameters"]["required"], json!([]));

        let weather = CURRENT_WEATHER_DEF.to_definition().to_api_format();
        assert_eq!(weather["function"]["parameters"]["required"], json!(["location"]));
        assert_eq!(
            weather["function"]["parameters"]["properties"]["location"]["type"],
            "string"
        );
    }

    #[tokio::test]
    async fn test_current_time_format() {
        let out = CurrentTimeTool::new().invoke(&Map::new()).await.unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&out, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[tokio::test]
    async fn test_weather_requires_location() {
        let err = offline_weather().invoke(&Map::new()).await.unwrap_err();
        assert!(matches!(err, InvocationError::MissingArgument(ref a) if a == "location"));
    }

    #[tokio::test]
    async fn test_weather_rejects_empty_or_non_string_city() {
        let tool = offline_weather();
        assert_eq!(
            tool.invoke(&args(json!({"location": "  "}))).await.unwrap(),
            EMPTY_CITY_MESSAGE
        );
        assert_eq!(
            tool.invoke(&args(json!({"location": 42}))).await.unwrap(),
            EMPTY_CITY_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_weather_call_through_dispatcher_uses_mapped_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Beijing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": 200,
                "name": "Beijing",
                "main": {"temp": 30, "feels_like": 33, "humidity": 70},
                "wind": {"speed": 1.5},
                "weather": [{"description": "多云"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = WeatherConfig {
            api_key: Some("k".into()),
            base_url: format!("{}/data/2.5/weather", server.uri()),
            ..Default::default()
        };
        let mut registry = ToolRegistry::new();
        register_local_tools(&mut registry, &config).unwrap();
        let dispatcher = ToolDispatcher::new(registry);

        let call = ToolCallRequest::new(
            "a",
            CURRENT_WEATHER_TOOL_NAME,
            ToolArguments::Raw(r#"{"location":"北京"}"#.into()),
        );
        let msg = dispatcher.dispatch(&call).await;
        assert_eq!(
            msg.content.as_deref(),
            Some("Beijing 当前天气：多云，温度 30°C (体感温度 33°C)，湿度 70%，风速 1.5 m/s。")
        );
    }
}
