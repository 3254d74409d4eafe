//! Response rendering for JSON views and the homepage
//!
//! The homepage template is plain HTML with `{{name}}` placeholders. It is
//! read from disk for every request so edits show up without a restart.

use std::path::PathBuf;

use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Json, Response};
use tracing::debug;

use crate::location_resolver::LOCATION_COOKIE;
use crate::models::{CityWeather, Coordinates};
use crate::{Result, WeatherError};

/// Record prepared for the homepage template
#[derive(Debug, Clone)]
pub struct HomepageView {
    /// Record with the temperature floored for display
    pub record: CityWeather,
    /// Full-precision JSON of the record, taken before flooring
    pub json: String,
}

impl HomepageView {
    pub fn new(mut record: CityWeather) -> Result<Self> {
        let json = serde_json::to_string(&record)
            .map_err(|e| WeatherError::render(format!("cannot serialize weather: {e}")))?;
        record.weather.temperature = record.weather.temperature.floor();
        Ok(Self { record, json })
    }

    fn placeholder(&self, name: &str) -> Option<String> {
        let city = &self.record.city;
        let weather = &self.record.weather;
        let value = match name {
            "city" => escape_html(&city.name),
            "country" => escape_html(city.country.as_deref().unwrap_or_default()),
            "conditions" => escape_html(&weather.conditions),
            "temperature" => format!("{}", weather.temperature),
            "wind" => escape_html(&weather.format_wind()),
            "latitude" => format!("{:.4}", city.coordinates.latitude),
            "longitude" => format!("{:.4}", city.coordinates.longitude),
            "json" => script_safe(&self.json),
            _ => return None,
        };
        Some(value)
    }
}

/// Turns pipeline results into HTTP responses
pub struct ResponseRenderer {
    template_path: PathBuf,
}

impl ResponseRenderer {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    /// `{city, weather}` as a JSON document
    pub fn json(record: CityWeather) -> Response {
        Json(record).into_response()
    }

    /// Render the homepage and, when given, set the location cookie
    pub async fn homepage(
        &self,
        record: CityWeather,
        cache: Option<Coordinates>,
    ) -> Result<Response> {
        let view = HomepageView::new(record)?;

        let template = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|e| {
                WeatherError::render(format!(
                    "cannot read template {}: {e}",
                    self.template_path.display()
                ))
            })?;
        let page = render_template(&template, &view)?;

        let mut response = Html(page).into_response();
        if let Some(coordinates) = cache {
            let cookie = location_cookie(&coordinates);
            debug!("Setting location cookie: {}", cookie);
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| WeatherError::render(format!("invalid cookie value: {e}")))?;
            response.headers_mut().insert(SET_COOKIE, value);
        }
        Ok(response)
    }
}

/// `Set-Cookie` value caching `coordinates` for the whole site
#[must_use]
pub fn location_cookie(coordinates: &Coordinates) -> String {
    format!(
        "{LOCATION_COOKIE}={}; Path=/",
        coordinates.to_cache_token()
    )
}

/// Substitute every `{{name}}` placeholder of `template`
pub fn render_template(template: &str, view: &HomepageView) -> Result<String> {
    let mut output = String::with_capacity(template.len() + view.json.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| WeatherError::render("template has an unclosed placeholder"))?;
        let name = after[..end].trim();
        let value = view.placeholder(name).ok_or_else(|| {
            WeatherError::render(format!("template references unknown field '{name}'"))
        })?;
        output.push_str(&value);
        rest = &after[end + 2..];
    }
    output.push_str(rest);

    Ok(output)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON that can sit inside a `<script>` element
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
