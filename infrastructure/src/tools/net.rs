//! Network information tools
//!
//! Thin wrappers over public no-auth endpoints: ifconfig.me for the
//! public address, apip.cc for geolocation, open-meteo for weather.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use conductor_domain::{ToolDefinition, ToolError, ToolHandle};

use super::{f64_arg, required_param, string_arg};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `get_public_ip` — public IP address of this machine.
pub fn get_public_ip_tool(client: &reqwest::Client) -> Arc<ToolHandle> {
    let definition =
        ToolDefinition::new("get_public_ip", "Get the public IP address of this machine");
    let client = client.clone();

    Arc::new(ToolHandle::plain(definition, move |_args| {
        let client = client.clone();
        Box::pin(async move {
            let text = client
                .get("https://ifconfig.me/ip")
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ToolError::execution_failed(e.to_string()))?
                .text()
                .await
                .map_err(|e| ToolError::execution_failed(e.to_string()))?;
            Ok(Value::String(text.trim().to_string()))
        })
    }))
}

/// `get_location_by_ip` — city/region/country for an IP address.
pub fn get_location_by_ip_tool(client: &reqwest::Client) -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "get_location_by_ip",
        "Get the location (city, region, country, coordinates) of an IP address",
    )
    .with_parameter(required_param("ip", "The IP address to look up"));
    let client = client.clone();

    Arc::new(ToolHandle::plain(definition, move |args| {
        let client = client.clone();
        Box::pin(async move {
            let ip = string_arg(&args, "ip")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: ip"))?;
            if !is_plausible_ip(&ip) {
                return Err(ToolError::invalid_argument(format!("Not an IP address: {}", ip)));
            }

            let body: Value = client
                .get(format!("https://apip.cc/api-json/{}", ip))
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ToolError::execution_failed(e.to_string()))?
                .json()
                .await
                .map_err(|e| ToolError::execution_failed(e.to_string()))?;
            Ok(body)
        })
    }))
}

/// `get_weather_forecast` — current weather for coordinates.
pub fn get_weather_forecast_tool(client: &reqwest::Client) -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "get_weather_forecast",
        "Get the current weather and short-term forecast for coordinates",
    )
    .with_parameter(required_param("latitude", "Latitude in decimal degrees").with_type("number"))
    .with_parameter(required_param("longitude", "Longitude in decimal degrees").with_type("number"));
    let client = client.clone();

    Arc::new(ToolHandle::plain(definition, move |args| {
        let client = client.clone();
        Box::pin(async move {
            let latitude = f64_arg(&args, "latitude")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: latitude"))?;
            let longitude = f64_arg(&args, "longitude")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: longitude"))?;

            let body: Value = client
                .get("https://api.open-meteo.com/v1/forecast")
                .query(&[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("current", "temperature_2m,wind_speed_10m".to_string()),
                    ("hourly", "temperature_2m,relative_humidity_2m".to_string()),
                    ("forecast_days", "1".to_string()),
                ])
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ToolError::execution_failed(e.to_string()))?
                .json()
                .await
                .map_err(|e| ToolError::execution_failed(e.to_string()))?;
            Ok(body)
        })
    }))
}

/// Loose shape check, enough to keep obvious junk out of the URL path.
fn is_plausible_ip(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= 45
        && candidate
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':')
}
