//! HTTP transport to the module.

use std::time::Duration;

use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::endpoint::{Endpoint, Method};
use crate::form::FormPayload;

/// Request failures. There is no retry; the user refreshes by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The module answered with a non-success status.
    #[error("module answered {0} for {1}")]
    Status(u16, Endpoint),

    /// The module could not be reached or the body could not be read.
    #[error("module unreachable: {0}")]
    Io(SmolStr),

    /// The endpoint does not accept the requested method.
    #[error("{0} cannot be called with {1}")]
    Method(Endpoint, &'static str),
}

/// Request/response access to the module's endpoints.
pub trait Transport {
    /// `GET` an endpoint and return the raw body.
    fn fetch(&mut self, endpoint: Endpoint) -> Result<String, TransportError>;

    /// `POST` a form to an endpoint and return the raw body.
    fn submit(&mut self, endpoint: Endpoint, form: &FormPayload)
        -> Result<String, TransportError>;
}

/// [`Transport`] over HTTP with a blocking `ureq` agent.
#[derive(Clone)]
pub struct HttpTransport {
    base: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Transport for the module at `base` (for example `http://192.168.4.1`).
    #[must_use]
    pub fn new(base: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            base: base.trim().trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Module URL without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base, endpoint.path())
    }

    fn finish(
        endpoint: Endpoint,
        response: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<String, TransportError> {
        let mut response = response.map_err(|err| {
            warn!("{endpoint} failed: {err}");
            TransportError::Io(err.to_string().into())
        })?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            warn!("{endpoint} answered status {status}");
            return Err(TransportError::Status(status, endpoint));
        }
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| TransportError::Io(format!("read body: {err}").into()))?;
        debug!("{endpoint} -> {status} ({} bytes)", body.len());
        Ok(body)
    }
}

impl Transport for HttpTransport {
    fn fetch(&mut self, endpoint: Endpoint) -> Result<String, TransportError> {
        if endpoint.method() != Method::Get {
            return Err(TransportError::Method(endpoint, Method::Get.as_str()));
        }
        debug!("{endpoint}");
        let response = self.agent.get(&self.url(endpoint)).call();
        Self::finish(endpoint, response)
    }

    fn submit(
        &mut self,
        endpoint: Endpoint,
        form: &FormPayload,
    ) -> Result<String, TransportError> {
        if endpoint.method() != Method::Post {
            return Err(TransportError::Method(endpoint, Method::Post.as_str()));
        }
        let body = form.encode();
        debug!("{endpoint} body={body}");
        let response = self
            .agent
            .post(&self.url(endpoint))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send(body.as_str());
        Self::finish(endpoint, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let transport = HttpTransport::new(" http://192.168.4.1/ ", Duration::from_secs(1));
        assert_eq!(transport.base(), "http://192.168.4.1");
        assert_eq!(
            transport.url(Endpoint::GetMeshGraph),
            "http://192.168.4.1/getMeshGraph"
        );
    }

    #[test]
    fn wrong_method_is_rejected_without_a_request() {
        let mut transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_millis(50));
        let err = transport.fetch(Endpoint::SetConfig).unwrap_err();
        assert_eq!(err, TransportError::Method(Endpoint::SetConfig, "GET"));
        let err = transport
            .submit(Endpoint::GetModuleInfo, &FormPayload::new())
            .unwrap_err();
        assert_eq!(err, TransportError::Method(Endpoint::GetModuleInfo, "POST"));
    }
}
