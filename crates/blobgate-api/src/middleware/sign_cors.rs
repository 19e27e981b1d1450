use axum::http::{header, HeaderMap, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

const ALLOW_METHODS: &str = "POST,OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// CORS settings for the sign route.
///
/// Browsers upload the file itself straight to the bucket, so this route is the
/// only one a front end calls cross-origin before the upload starts.
#[derive(Clone)]
pub struct SignCorsConfig {
    pub allowed_origins: Vec<String>,
}

impl SignCorsConfig {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    /// Value for `Access-Control-Allow-Origin`: `*` when any origin is allowed,
    /// the caller's origin when it is listed, otherwise the first listed origin.
    pub fn allow_origin_for(&self, request_origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        if let Some(origin) = request_origin {
            if self.allowed_origins.iter().any(|o| o == origin) {
                return Some(origin.to_string());
            }
        }
        self.allowed_origins.first().cloned()
    }
}

/// Adds the CORS headers to every response of the sign route, errors included.
pub async fn sign_cors_middleware(
    State(config): State<Arc<SignCorsConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let request_origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut response = next.run(request).await;
    apply_headers(
        response.headers_mut(),
        config.allow_origin_for(request_origin.as_deref()),
    );
    response
}

fn apply_headers(headers: &mut HeaderMap, allow_origin: Option<String>) {
    if let Some(origin) = allow_origin {
        match HeaderValue::from_str(&origin) {
            Ok(value) => {
                if origin != "*" {
                    headers.append(header::VARY, HeaderValue::from_static("Origin"));
                }
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
            }
            Err(_) => {
                tracing::warn!(origin = %origin, "Configured CORS origin is not a valid header value");
            }
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_wins() {
        let config = SignCorsConfig::new(vec!["https://a.example".into(), "*".into()]);
        assert_eq!(
            config.allow_origin_for(Some("https://b.example")).as_deref(),
            Some("*")
        );
    }

    #[test]
    fn test_listed_origin_is_echoed() {
        let config = SignCorsConfig::new(vec![
            "http://localhost:5173".into(),
            "https://app.example".into(),
        ]);
        assert_eq!(
            config.allow_origin_for(Some("https://app.example")).as_deref(),
            Some("https://app.example")
        );
        assert_eq!(
            config.allow_origin_for(Some("https://evil.example")).as_deref(),
            Some("http://localhost:5173")
        );
        assert_eq!(
            config.allow_origin_for(None).as_deref(),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn test_headers_are_set() {
        let mut headers = HeaderMap::new();
        apply_headers(&mut headers, Some("*".to_string()));
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert!(headers.get(header::VARY).is_none());
    }
}
