//! HTTP helpers for the API Gateway Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::{Error, Result};

/// Error body returned to the front end.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>> {
    let json = serde_json::to_string(data)?;
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::from(json))
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// `{}` with status 200.
pub fn empty_response() -> Result<Response<Body>> {
    json_response(200, &serde_json::json!({}))
}

/// Turn a handler error into its JSON response, logging it on the way.
pub fn error_response(err: &Error) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let status = err.status_code();
    if status >= 500 {
        error!(error = %err, "Request failed");
    } else {
        warn!(status, error = %err, "Request rejected");
    }

    Ok(json_response(status, &ErrorBody { error: err.public_message() })?)
}

/// Parse a JSON request body; a missing or malformed body is `invalid body`.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    serde_json::from_slice(body.as_ref()).map_err(|e| {
        warn!(error = %e, "Unparseable request body");
        Error::Validation("invalid body".to_string())
    })
}

/// Parse a positive integer path id.
pub fn parse_id(raw: &str) -> Result<i32> {
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::Validation("invalid id".to_string())),
    }
}

/// Strip the API Gateway stage prefix and any trailing slash.
pub fn normalize_path(raw_path: &str) -> &str {
    let path = match raw_path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => raw_path,
    };
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Path segments after the resource prefix, e.g. `/slots/4/bookingpaid`
/// under `/slots` gives `["4", "bookingpaid"]`. `None` when the path is
/// outside the resource.
pub fn segments_under<'a>(path: &'a str, resource: &str) -> Option<Vec<&'a str>> {
    let rest = path.strip_prefix(resource)?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let rest = rest.strip_prefix('/')?;
    Some(rest.split('/').collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("abc").is_err());
        assert_eq!(parse_id("").unwrap_err().to_string(), "invalid id");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/slots/"), "/slots");
        assert_eq!(normalize_path("/slots/3"), "/slots/3");
        assert_eq!(normalize_path("/api"), "/");
        assert_eq!(normalize_path("/apiary"), "/apiary");
    }

    #[test]
    fn test_segments_under() {
        assert_eq!(segments_under("/slots", "/slots"), Some(vec![]));
        assert_eq!(
            segments_under("/slots/4/bookingpaid", "/slots"),
            Some(vec!["4", "bookingpaid"])
        );
        assert_eq!(segments_under("/slotsx", "/slots"), None);
        assert_eq!(segments_under("/clients/1", "/slots"), None);
    }

    #[test]
    fn test_parse_json_body() {
        #[derive(Debug, serde::Deserialize)]
        struct DateBody {
            date: String,
        }

        let parsed: DateBody = parse_json_body(&Body::from(r#"{"date":"2024-01-01"}"#)).unwrap();
        assert_eq!(parsed.date, "2024-01-01");

        let err = parse_json_body::<DateBody>(&Body::Empty).unwrap_err();
        assert_eq!(err.to_string(), "invalid body");
    }

    #[test]
    fn test_error_response_hides_internal_errors() {
        let response = error_response(&Error::Aws("SES throttled".into())).unwrap();
        assert_eq!(response.status(), 500);
        let body: serde_json::Value = serde_json::from_slice(response.body().as_ref()).unwrap();
        assert_eq!(body["error"], "server error");

        let response = error_response(&Error::NotFound("no slot found".into())).unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(
            response.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }
}
