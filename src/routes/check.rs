//! Check route
//!
//! POST /check-pdf with `{"student_pdf_url": ..., "markscheme_pdf_url": ...}`

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, MISSING_INPUT_MESSAGE};
use crate::state::AppState;

/// Request body; fields are optional so their absence maps to a 400
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub student_pdf_url: Option<String>,
    #[serde(default)]
    pub markscheme_pdf_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub message: &'static str,
    pub file_url: String,
}

/// POST /check-pdf
pub async fn check_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckResponse>> {
    let (student_url, markscheme_url) = parse_request(&body)?;

    let outcome = state.pipeline().run(&student_url, &markscheme_url).await?;

    let base = match &state.config().server.public_base_url {
        Some(configured) => normalize_base(configured),
        None => base_url_from_headers(&headers, state.config().server.port),
    };

    Ok(Json(CheckResponse {
        message: "AI Check Completed",
        file_url: format!("{}download/{}", base, outcome.output_filename),
    }))
}

/// Extract both URLs from a JSON object body
///
/// Anything else (not JSON, a non-object value, missing or non-string
/// fields) is a missing-input error.
fn parse_request(body: &[u8]) -> Result<(String, String)> {
    let missing = || AppError::MissingInput(MISSING_INPUT_MESSAGE.to_string());

    // Struct deserialization would also accept a positional JSON array
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(body).map_err(|_| missing())?;
    let request: CheckRequest =
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|_| missing())?;

    match (request.student_pdf_url, request.markscheme_pdf_url) {
        (Some(student), Some(markscheme)) => Ok((student, markscheme)),
        _ => Err(AppError::MissingInput(MISSING_INPUT_MESSAGE.to_string())),
    }
}

/// `<scheme>://<host>/` as seen by the client
fn base_url_from_headers(headers: &HeaderMap, port: u16) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", port));

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|v| *v == "https" || *v == "http")
        .unwrap_or("http");

    format!("{}://{}/", scheme, host)
}

fn normalize_base(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_request() {
        let body = br#"{"student_pdf_url": "http://a/s.pdf", "markscheme_pdf_url": "http://a/m.pdf"}"#;
        let (student, markscheme) = parse_request(body).unwrap();
        assert_eq!(student, "http://a/s.pdf");
        assert_eq!(markscheme, "http://a/m.pdf");
    }

    #[test]
    fn test_parse_request_missing_fields() {
        for body in [
            &br#"{"student_pdf_url": "http://a/s.pdf"}"#[..],
            &br#"{}"#[..],
            &br#"[]"#[..],
            &br#"["http://a/s.pdf", "http://a/m.pdf"]"#[..],
            &br#""http://a/s.pdf""#[..],
            &br#"{"student_pdf_url": 1, "markscheme_pdf_url": "http://a/m.pdf"}"#[..],
            &b""[..],
            &b"not json"[..],
        ] {
            let err = parse_request(body).unwrap_err();
            assert!(matches!(err, AppError::MissingInput(_)));
            assert_eq!(err.to_string(), MISSING_INPUT_MESSAGE);
        }
    }

    #[test]
    fn test_base_url_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(base_url_from_headers(&headers, 5000), "http://localhost:5000/");

        headers.insert(header::HOST, HeaderValue::from_static("grader.example.com"));
        assert_eq!(base_url_from_headers(&headers, 5000), "http://grader.example.com/");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(base_url_from_headers(&headers, 5000), "https://grader.example.com/");
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("https://cdn.example.com"), "https://cdn.example.com/");
        assert_eq!(normalize_base("https://cdn.example.com/"), "https://cdn.example.com/");
    }
}
