//! Blocking HTTP request sender with typed failure classification.
//!
//! [`RestClient::send`] issues one request, attaches the auth header,
//! serializes structured bodies to JSON and inspects the response for error
//! signals. The protocol convention is that the server may report
//! application-level errors inside a 200 response, so a response is treated
//! as a failure when any of: status >= 400, the body is not parseable JSON,
//! or the parsed mapping carries a `traceback` or `error` key.

use std::time::Duration;

use log::{debug, warn};
use reqwest::Method;
use serde_json::Value;

use crate::constants::{AUTH_SCHEME, headers};
use crate::error::{ApiError, Error, Result, classify};
use crate::model::value_text;

/// Raw response returned when no error signal was detected. The status code,
/// parsed JSON body (if any) and the raw body text all remain accessible for
/// the caller to interpret.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

impl ApiResponse {
    /// The parsed body as a JSON object, if it is one.
    pub fn json_object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.json.as_ref().and_then(Value::as_object)
    }
}

/// Thin wrapper over a pooled `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::blocking::Client,
}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RestClient {
    pub fn new() -> Self {
        let http = reqwest::blocking::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rest-models/0.1")
            .build()
            .expect("Failed to build HTTP client");

        Self { http }
    }

    /// Use a pre-configured blocking client (custom timeouts, proxies, ...).
    pub fn with_custom_client(http: reqwest::blocking::Client) -> Self {
        Self { http }
    }

    /// Send one request and return the raw response, or a classified failure.
    ///
    /// A token, when present, is attached as `Authorization: JWT <token>`.
    /// Structured bodies are serialized to JSON; the JSON content-type and
    /// plain-text accept headers are only set for the body-carrying mutation
    /// verbs (POST/PUT).
    pub fn send(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let mut request = self.http.request(method.clone(), url);

        if let Some(token) = token {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", AUTH_SCHEME, token),
            );
        }

        if let Some(body) = body {
            if method == Method::POST || method == Method::PUT {
                request = request
                    .header(reqwest::header::CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
                    .header(reqwest::header::ACCEPT, headers::ACCEPT_PLAIN);
            }
            request = request.body(serde_json::to_string(body)?);
        }

        debug!("{} {}", method, url);
        let response = request.send()?;
        let status = response.status().as_u16();
        let body_text = response.text()?;
        let json = serde_json::from_str::<Value>(&body_text).ok();

        if let Some(error) = detect_error(status, json.as_ref()) {
            let message = format_diagnostic(status, url, &method, &error, json.as_ref(), &body_text);
            let kind = classify(status, &error.error);
            warn!("classified {} {} as {:?}", method, url, kind);
            return Err(Error::Api(ApiError {
                kind,
                status,
                error: error.error,
                message,
            }));
        }

        Ok(ApiResponse {
            status,
            body: body_text,
            json,
        })
    }
}

struct ErrorSignal {
    error: String,
    traceback: String,
}

/// Decide whether the response carries an error signal, and extract the
/// server-reported error and traceback strings if so.
fn detect_error(status: u16, json: Option<&Value>) -> Option<ErrorSignal> {
    let map = json.and_then(Value::as_object);
    let keyed = map.is_some_and(|m| m.contains_key("traceback") || m.contains_key("error"));
    if status < 400 && json.is_some() && !keyed {
        return None;
    }

    let mut signal = ErrorSignal {
        error: "Unknown error".to_string(),
        traceback: "No traceback".to_string(),
    };
    if let Some(map) = map {
        if let Some(error) = map.get("error") {
            signal.error = value_text(error);
        }
        if let Some(traceback) = map.get("traceback") {
            signal.traceback = value_text(traceback);
        }
    }
    Some(signal)
}

/// Operator-facing diagnostic: status, url, method, error text, traceback
/// text and the raw body, all on one blob for development-server debugging.
fn format_diagnostic(
    status: u16,
    url: &str,
    method: &Method,
    signal: &ErrorSignal,
    json: Option<&Value>,
    body: &str,
) -> String {
    let content = match json.and_then(Value::as_object) {
        Some(map) => Value::Object(map.clone()).to_string(),
        None => body.to_string(),
    };
    format!(
        "API {} error on {} with method={} - {}\n{}\n{}\n{}",
        status, url, method, signal.error, signal.error, signal.traceback, content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_json_response_is_not_an_error() {
        let body = json!({"id": 1});
        assert!(detect_error(200, Some(&body)).is_none());
    }

    #[test]
    fn bare_list_response_is_not_an_error() {
        let body = json!([{"id": 1}]);
        assert!(detect_error(200, Some(&body)).is_none());
    }

    #[test]
    fn status_400_triggers_even_with_clean_body() {
        let body = json!({"id": 1});
        assert!(detect_error(400, Some(&body)).is_some());
    }

    #[test]
    fn unparseable_body_triggers() {
        let signal = detect_error(200, None).unwrap();
        assert_eq!(signal.error, "Unknown error");
        assert_eq!(signal.traceback, "No traceback");
    }

    #[test]
    fn error_key_triggers_on_200() {
        let body = json!({"error": "Authentication failed."});
        let signal = detect_error(200, Some(&body)).unwrap();
        assert_eq!(signal.error, "Authentication failed.");
    }

    #[test]
    fn traceback_key_triggers_on_200() {
        let body = json!({"traceback": "Traceback (most recent call last): ..."});
        let signal = detect_error(200, Some(&body)).unwrap();
        assert_eq!(signal.error, "Unknown error");
        assert!(signal.traceback.starts_with("Traceback"));
    }

    #[test]
    fn diagnostic_contains_all_parts() {
        let body = json!({"error": "Resource not found."});
        let signal = detect_error(404, Some(&body)).unwrap();
        let message = format_diagnostic(
            404,
            "http://api/books/9/",
            &Method::GET,
            &signal,
            Some(&body),
            "{\"error\":\"Resource not found.\"}",
        );
        assert!(message.contains("API 404 error on http://api/books/9/ with method=GET"));
        assert!(message.contains("Resource not found."));
        assert!(message.contains("No traceback"));
    }
}
