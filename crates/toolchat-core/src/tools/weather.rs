//! OpenWeather current-weather lookup.
//!
//! Failures are not errors from the model's point of view: they are rendered
//! as a `⚠️ 获取天气失败: ` line and returned as the tool result.

use crate::config::WeatherConfig;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use thiserror::Error;

const WEATHER_USER_AGENT: &str = "weather-app/1.0";
const FAILURE_PREFIX: &str = "⚠️ 获取天气失败: ";

/// City aliases the API does not resolve reliably, keyed by a lowercase fragment.
const CITY_ALIASES: &[(&[&str], &str)] = &[
    (&["北京", "beijing"], "Beijing"),
    (&["上海", "shanghai"], "Shanghai"),
    (&["杭州", "hangzhou"], "Hangzhou"),
];

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("OpenWeather API Key 未配置。")]
    MissingApiKey,

    #[error("HTTP 错误: {status}{}", detail_suffix(.message))]
    Http {
        status: u16,
        /// `Some` when the error body was JSON.
        message: Option<String>,
    },

    #[error("请求超时")]
    Timeout,

    #[error("请求失败: {0}")]
    Request(String),

    #[error("无法解析天气数据: {0}")]
    Decode(String),

    /// The payload itself reported a non-200 `cod`.
    #[error("{0}")]
    Api(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" - {m}"))
        .unwrap_or_default()
}

impl WeatherError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout
        } else if err.is_decode() {
            WeatherError::Decode(err.to_string())
        } else {
            WeatherError::Request(err.to_string())
        }
    }

    /// The user-visible failure line.
    pub fn render(&self) -> String {
        format!("{FAILURE_PREFIX}{self}")
    }
}

/// Map well-known Chinese or pinyin city names onto the API's spelling.
/// Anything else is passed through unchanged.
pub fn map_city(location: &str) -> String {
    let lower = location.to_lowercase();
    for (aliases, canonical) in CITY_ALIASES {
        if aliases.iter().any(|alias| lower.contains(alias)) {
            log::debug!("mapped city '{}' to '{}'", location, canonical);
            return (*canonical).to_string();
        }
    }
    location.to_string()
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Fetch the raw current-weather payload for an already-mapped city.
    pub async fn fetch(&self, city: &str) -> Result<Value, WeatherError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(WeatherError::MissingApiKey)?;

        let url = url::Url::parse_with_params(
            &self.config.base_url,
            &[
                ("q", city),
                ("appid", api_key),
                ("units", self.config.units.as_str()),
                ("lang", self.config.lang.as_str()),
            ],
        )
        .map_err(|e| WeatherError::Request(e.to_string()))?;

        log::debug!("fetching weather for {}", city);
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, WEATHER_USER_AGENT)
            .send()
            .await
            .map_err(WeatherError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body).ok().map(|v| {
                v.get("message")
                    .map(|m| display_value(Some(m), ""))
                    .unwrap_or_else(|| "未知 API 错误".to_string())
            });
            return Err(WeatherError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(WeatherError::from_reqwest)
    }

    /// Map, fetch and format. Always yields a single line of text.
    pub async fn current_weather(&self, location: &str) -> String {
        let city = map_city(location);
        match self.fetch(&city).await {
            Ok(data) => format_weather(&data),
            Err(e) => {
                log::warn!("weather lookup for {} failed: {}", city, e);
                e.render()
            }
        }
    }
}

/// Render a JSON scalar without quotes, falling back to `default` when absent.
fn display_value(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Format an OpenWeather payload into a one-line summary.
pub fn format_weather(data: &Value) -> String {
    let cod = display_value(data.get("cod"), "N/A");
    if cod != "200" {
        let message = data
            .get("message")
            .map(|m| display_value(Some(m), ""))
            .unwrap_or_else(|| format!("API 返回错误码 {cod}"));
        return WeatherError::Api(message).render();
    }

    let city = display_value(data.get("name"), "未知地点");
    let country = data
        .pointer("/sys/country")
        .filter(|c| !c.is_null() && c.as_str() != Some(""))
        .map(|c| format!(", {}", display_value(Some(c), "")))
        .unwrap_or_default();
    let temp = display_value(data.pointer("/main/temp"), "N/A");
    let feels_like = display_value(data.pointer("/main/feels_like"), "N/A");
    let humidity = display_value(data.pointer("/main/humidity"), "N/A");
    let wind_speed = display_value(data.pointer("/wind/speed"), "N/A");
    let description = display_value(data.pointer("/weather/0/description"), "未知");

    format!(
        "{city}{country} 当前天气：{description}，温度 {temp}°C (体感温度 {feels_like}°C)，湿度 {humidity}%，风速 {wind_speed} m/s。"
    )
}
