//! Response builders shared by the gate, the routes and the metrics server

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Response body type used throughout the service
pub type Body = Full<Bytes>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Response with an explicit content type
pub fn with_content_type(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response<Body> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    let value = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    response.headers_mut().insert(CONTENT_TYPE, value);
    response
}

/// Plain text response
pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<Body> {
    with_content_type(status, TEXT_PLAIN, body)
}

/// JSON response from pre-serialised bytes
pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Response<Body> {
    with_content_type(status, APPLICATION_JSON, body)
}

/// JSON response from a serde value
pub fn json_value(status: StatusCode, value: &serde_json::Value) -> Response<Body> {
    json(status, value.to_string())
}

/// 401 returned when the decision engine denies a request
pub fn unauthorized() -> Response<Body> {
    text(StatusCode::UNAUTHORIZED, "Unauthorized")
}

/// 500 returned when no decision could be obtained
pub fn internal_error() -> Response<Body> {
    text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let response = unauthorized();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(body_string(response).await, "Unauthorized");
    }

    #[tokio::test]
    async fn test_json_value() {
        let response = json_value(StatusCode::OK, &serde_json::json!({"status": "alive"}));
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(body_string(response).await, r#"{"status":"alive"}"#);
    }

    #[test]
    fn test_invalid_content_type_falls_back() {
        let response = with_content_type(StatusCode::OK, "bad\ntype", "x");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
    }
}
