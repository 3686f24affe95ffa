//! Remote dispatch: forward instructions to a `/request` endpoint

use crate::checksum::Checksum;
use crate::error::{FileProcessorError, FileProcessorResult};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Posts `{instructions, checksum}` to the remote endpoint and returns the
/// response body verbatim. Caching is the remote side's concern; there is
/// no retry and no local fallback.
#[derive(Clone)]
pub struct RemoteDispatcher {
    agent: ureq::Agent,
    endpoint: Url,
}

impl RemoteDispatcher {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn post_blocking(&self, form: Vec<(&'static str, String)>) -> FileProcessorResult<String> {
        let unavailable =
            |e: ureq::Error| FileProcessorError::remote_unavailable(self.endpoint.as_str(), e.to_string());

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .send_form(form)
            .map_err(unavailable)?;

        let status = response.status();
        let body = response.body_mut().read_to_string().map_err(unavailable)?;

        if !status.is_success() {
            return Err(FileProcessorError::remote_unavailable(
                self.endpoint.as_str(),
                format!("endpoint answered HTTP {}: {}", status, body.trim()),
            ));
        }

        Ok(body)
    }

    /// Forward `instructions` (and the checksum, when known) to the endpoint
    pub async fn dispatch(
        &self,
        instructions: &str,
        checksum: Option<&Checksum>,
    ) -> FileProcessorResult<String> {
        let mut form = vec![("instructions", instructions.to_string())];
        if let Some(checksum) = checksum {
            form.push(("checksum", checksum.to_string()));
        }

        debug!(
            "Dispatching {} to {}",
            checksum.map(Checksum::as_str).unwrap_or("<unknown>"),
            self.endpoint
        );

        let this = self.clone();
        tokio::task::spawn_blocking(move || this.post_blocking(form))
            .await
            .map_err(|e| FileProcessorError::Internal(format!("dispatch task failed: {}", e)))?
    }
}
