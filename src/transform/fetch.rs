//! Fetch transformation: download the resource named by the instructions

use crate::config::schema::FetchConfig;
use crate::error::{FileProcessorError, FileProcessorResult};
use crate::transform::{Materialized, Transformer};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Extension used when neither the URL nor the content type names one
const FALLBACK_EXTENSION: &str = "bin";

/// Downloads `http(s)` URLs with a blocking `ureq` agent on the blocking pool
#[derive(Clone)]
pub struct FetchTransformer {
    agent: ureq::Agent,
    max_bytes: u64,
    user_agent: String,
}

impl FetchTransformer {
    /// Create a fetch transformer from config
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_deadline(config, None)
    }

    /// Create a fetch transformer whose requests also end by `deadline`
    ///
    /// The blocking request cannot be cancelled from async code, so the
    /// derivation deadline has to bound the request itself.
    pub fn with_deadline(config: &FetchConfig, deadline: Option<Duration>) -> Self {
        let mut timeout = Duration::from_secs(config.timeout_secs);
        if let Some(deadline) = deadline {
            timeout = timeout.min(deadline);
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            max_bytes: config.max_bytes,
            user_agent: config.user_agent.clone(),
        }
    }

    fn fetch_blocking(&self, url: &Url) -> FileProcessorResult<(Vec<u8>, Option<String>)> {
        let mut response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", &self.user_agent)
            .call()
            .map_err(|e| FileProcessorError::source_unavailable(url.as_str(), e.to_string()))?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(|e| FileProcessorError::source_unavailable(url.as_str(), e.to_string()))?;

        Ok((bytes, content_type))
    }
}

/// Parse instructions as a source URL
pub(crate) fn parse_source_url(instructions: &str) -> FileProcessorResult<Url> {
    let url = Url::parse(instructions.trim()).map_err(|e| {
        FileProcessorError::invalid_input(format!("instructions are not a URL: {}", e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FileProcessorError::invalid_input(format!(
            "unsupported source scheme '{}'",
            other
        ))),
    }
}

/// Pick the stored file's extension from the URL path, then the content type
pub(crate) fn extension_for(url: &Url, content_type: Option<&str>) -> String {
    let from_path = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_path {
        return ext;
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    match mime.as_deref() {
        Some("image/gif") => "gif",
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/webp") => "webp",
        Some("image/svg+xml") => "svg",
        Some("text/html") => "html",
        Some("text/plain") => "txt",
        Some("application/pdf") => "pdf",
        _ => FALLBACK_EXTENSION,
    }
    .to_string()
}

#[async_trait]
impl Transformer for FetchTransformer {
    async fn transform(&self, instructions: &str) -> FileProcessorResult<Materialized> {
        let url = parse_source_url(instructions)?;
        debug!("Fetching source {}", url);

        let this = self.clone();
        let fetch_url = url.clone();
        let (bytes, content_type) =
            tokio::task::spawn_blocking(move || this.fetch_blocking(&fetch_url))
                .await
                .map_err(|e| FileProcessorError::Internal(format!("fetch task failed: {}", e)))??;

        let extension = extension_for(&url, content_type.as_deref());
        debug!("Fetched {} bytes from {} (.{})", bytes.len(), url, extension);

        Ok(Materialized::new(bytes, extension))
    }

    fn name(&self) -> &'static str {
        "fetch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::testing::spawn_source;
    use axum::{http::StatusCode, routing::get, Router};
    use std::time::Instant;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn extension_from_path() {
        assert_eq!(extension_for(&url("http://example.org/hart.gif"), None), "gif");
        assert_eq!(extension_for(&url("http://example.org/a/B.PNG?x=1"), None), "png");
    }

    #[test]
    fn extension_from_content_type() {
        assert_eq!(
            extension_for(&url("http://www.google.com/"), Some("text/html; charset=ISO-8859-1")),
            "html"
        );
        assert_eq!(
            extension_for(&url("http://example.org/image"), Some("image/jpeg")),
            "jpg"
        );
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(extension_for(&url("http://example.org/data"), None), "bin");
    }

    #[test]
    fn source_url_must_be_http() {
        assert!(parse_source_url("http://example.org/hart.gif").is_ok());
        assert!(parse_source_url("  https://example.org/x  ").is_ok());
        assert!(matches!(
            parse_source_url("file:///etc/passwd"),
            Err(FileProcessorError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_source_url("my instructions"),
            Err(FileProcessorError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_source_is_source_unavailable() {
        let config = FetchConfig {
            timeout_secs: 2,
            ..FetchConfig::default()
        };
        let transformer = FetchTransformer::new(&config);

        // Port 9 (discard) on loopback is not expected to serve HTTP
        let err = transformer
            .transform("http://127.0.0.1:9/missing.gif")
            .await
            .unwrap_err();

        assert!(matches!(err, FileProcessorError::SourceUnavailable { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fetches_body_and_extension_from_content_type() {
        let base = spawn_source(Router::new().route(
            "/image",
            get(|| async { ([("content-type", "image/png")], b"\x89PNG".to_vec()) }),
        ))
        .await;

        let transformer = FetchTransformer::new(&FetchConfig::default());
        let materialized = transformer
            .transform(&format!("{}/image", base))
            .await
            .unwrap();

        assert_eq!(materialized.bytes, b"\x89PNG");
        assert_eq!(materialized.extension, "png");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_source_unavailable() {
        let base = spawn_source(Router::new().route(
            "/gone.gif",
            get(|| async { (StatusCode::NOT_FOUND, "no such file") }),
        ))
        .await;

        let transformer = FetchTransformer::new(&FetchConfig::default());
        let err = transformer
            .transform(&format!("{}/gone.gif", base))
            .await
            .unwrap_err();

        match err {
            FileProcessorError::SourceUnavailable { url, reason } => {
                assert!(url.ends_with("/gone.gif"));
                assert!(reason.contains("404"), "reason: {}", reason);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deadline_bounds_the_request() {
        let base = spawn_source(Router::new().route(
            "/slow.gif",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(1500)).await;
                "late"
            }),
        ))
        .await;

        let transformer =
            FetchTransformer::with_deadline(&FetchConfig::default(), Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = transformer
            .transform(&format!("{}/slow.gif", base))
            .await
            .unwrap_err();

        assert!(matches!(err, FileProcessorError::SourceUnavailable { .. }));
        assert!(started.elapsed() < Duration::from_millis(1000));
    }
}
