//! Web tools — search and page fetch
//!
//! `web_search` uses the DuckDuckGo Instant Answer API (no API key);
//! `fetch_url` retrieves a page and reduces HTML to readable text.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use conductor_domain::{ToolDefinition, ToolError, ToolHandle};

use super::{required_param, string_arg, usize_arg};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DDG_API_URL: &str = "https://api.duckduckgo.com/";
const MAX_RELATED_TOPICS: usize = 8;
const DEFAULT_FETCH_LIMIT: usize = 16 * 1024;

/// `web_search` — instant answers, abstracts, and related topics.
pub fn web_search_tool(client: &reqwest::Client) -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "web_search",
        "Search the web via DuckDuckGo. Returns instant answers, abstracts, and related links.",
    )
    .with_parameter(required_param("query", "The search query"));
    let client = client.clone();

    Arc::new(ToolHandle::plain(definition, move |args| {
        let client = client.clone();
        Box::pin(async move {
            let query = string_arg(&args, "query")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: query"))?;

            let body: Value = client
                .get(DDG_API_URL)
                .query(&[
                    ("q", query.as_str()),
                    ("format", "json"),
                    ("no_html", "1"),
                    ("skip_disambig", "1"),
                ])
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ToolError::execution_failed(format!("Search failed: {}", e)))?
                .json()
                .await
                .map_err(|e| ToolError::execution_failed(format!("Bad search response: {}", e)))?;

            Ok(Value::String(format_search_results(&query, &body)))
        })
    }))
}

/// `fetch_url` — fetch a page, returning readable text for HTML bodies.
pub fn fetch_url_tool(client: &reqwest::Client) -> Arc<ToolHandle> {
    let definition = ToolDefinition::new(
        "fetch_url",
        "Fetch a URL and return its content; HTML is reduced to readable text",
    )
    .with_parameter(required_param("url", "The http(s) URL to fetch"))
    .with_parameter(
        conductor_domain::ToolParameter::new(
            "max_bytes",
            "Maximum characters to return, default 16384",
            false,
        )
        .with_type("integer"),
    );
    let client = client.clone();

    Arc::new(ToolHandle::plain(definition, move |args| {
        let client = client.clone();
        Box::pin(async move {
            let url = string_arg(&args, "url")
                .ok_or_else(|| ToolError::invalid_argument("Missing required argument: url"))?;
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ToolError::invalid_argument(format!(
                    "Only http(s) URLs are supported: {}",
                    url
                )));
            }
            let limit = usize_arg(&args, "max_bytes").unwrap_or(DEFAULT_FETCH_LIMIT);

            let response = client
                .get(&url)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ToolError::execution_failed(format!("Fetch failed: {}", e)))?;

            let is_html = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("text/html"))
                .unwrap_or(false);

            let body = response
                .text()
                .await
                .map_err(|e| ToolError::execution_failed(e.to_string()))?;

            let text = if is_html { html_to_text(&body) } else { body };
            let mut text = text;
            if text.len() > limit {
                let mut cut = limit;
                while cut > 0 && !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
                text.push_str("\n[truncated]");
            }
            Ok(Value::String(text))
        })
    }))
}

/// Format the Instant Answer payload into readable sections.
fn format_search_results(query: &str, data: &Value) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(abstract_text) = data.get("AbstractText").and_then(Value::as_str)
        && !abstract_text.is_empty()
    {
        let source = data
            .get("AbstractSource")
            .and_then(Value::as_str)
            .unwrap_or("");
        if source.is_empty() {
            sections.push(format!("Summary: {}", abstract_text));
        } else {
            sections.push(format!("Summary ({}): {}", source, abstract_text));
        }
    }

    if let Some(answer) = data.get("Answer").and_then(Value::as_str)
        && !answer.is_empty()
    {
        sections.push(format!("Answer: {}", answer));
    }

    if let Some(definition) = data.get("Definition").and_then(Value::as_str)
        && !definition.is_empty()
    {
        sections.push(format!("Definition: {}", definition));
    }

    if let Some(topics) = data.get("RelatedTopics").and_then(Value::as_array) {
        let mut lines = Vec::new();
        for topic in topics.iter().take(MAX_RELATED_TOPICS) {
            let text = topic.get("Text").and_then(Value::as_str).unwrap_or("");
            let url = topic.get("FirstURL").and_then(Value::as_str).unwrap_or("");
            if !text.is_empty() {
                lines.push(format!("- {} ({})", text, url));
            }
        }
        if !lines.is_empty() {
            sections.push(format!("Related:\n{}", lines.join("\n")));
        }
    }

    if sections.is_empty() {
        format!("No instant answer for '{}'. Try fetch_url on a specific page.", query)
    } else {
        sections.join("\n\n")
    }
}

/// Strip an HTML document to its visible text.
fn html_to_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse("body").expect("body selector");

    let root_text: String = match document.select(&selector).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    };

    // Collapse whitespace runs left behind by markup.
    root_text.split_whitespace().collect::<Vec<_>>().join(" ")
}
