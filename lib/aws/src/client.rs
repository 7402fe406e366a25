//! A minimal client for AWS JSON 1.1 protocol services.
//!
//! Every operation is a `POST /` whose `X-Amz-Target` header names the
//! operation and whose body is the JSON request. Errors come back with a
//! non-2xx status and a body carrying `__type` and `message`.

use crate::config::AwsConfig;
use crate::error::AwsError;
use crate::sigv4::{SignableRequest, Signer};
use reqwest::Url;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// How a service is addressed and signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Service name in the signing scope.
    pub signing_name: &'static str,
    /// First label of the regional endpoint host.
    pub endpoint_prefix: &'static str,
    /// Prefix of the `X-Amz-Target` header.
    pub target_prefix: &'static str,
}

/// The user pool service.
pub const COGNITO_IDP: ServiceDescriptor = ServiceDescriptor {
    signing_name: "cognito-idp",
    endpoint_prefix: "cognito-idp",
    target_prefix: "AWSCognitoIdentityProviderService",
};

/// The deployment service.
pub const CODEDEPLOY: ServiceDescriptor = ServiceDescriptor {
    signing_name: "codedeploy",
    endpoint_prefix: "codedeploy",
    target_prefix: "CodeDeploy_20141006",
};

/// Calls operations of one JSON-protocol service.
#[derive(Debug, Clone)]
pub struct AwsJsonClient {
    http: reqwest::Client,
    endpoint: Url,
    host: String,
    service: ServiceDescriptor,
    signer: Option<Signer>,
}

impl AwsJsonClient {
    /// Creates a client for `endpoint`. Requests are signed when a signer
    /// is given; public operations such as sign-up go unsigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint has no host.
    pub fn new(
        http: reqwest::Client,
        endpoint: Url,
        service: ServiceDescriptor,
        signer: Option<Signer>,
    ) -> Result<Self, AwsError> {
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(AwsError::InvalidEndpoint {
                    url: endpoint.to_string(),
                    details: "endpoint has no host".to_string(),
                });
            }
        };

        Ok(Self {
            http,
            endpoint,
            host,
            service,
            signer,
        })
    }

    /// Creates a signing client from the environment configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the service endpoint is invalid.
    pub fn from_config(
        http: reqwest::Client,
        config: &AwsConfig,
        service: ServiceDescriptor,
    ) -> Result<Self, AwsError> {
        let endpoint = config.endpoint_for(service.endpoint_prefix)?;
        let signer = Signer::new(config.credentials(), &config.region, service.signing_name);
        Self::new(http, endpoint, service, Some(signer))
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Invokes `operation` with `request` and decodes the response.
    ///
    /// # Errors
    ///
    /// Returns `Service` when the service answers with an error status,
    /// `RequestFailed` when no answer arrives, and `InvalidResponse` when the
    /// answer cannot be decoded.
    #[instrument(skip(self, request), fields(service = self.service.signing_name))]
    pub async fn call<Req, Resp>(&self, operation: &'static str, request: &Req) -> Result<Resp, AwsError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(|e| AwsError::Encode {
            operation,
            details: e.to_string(),
        })?;
        let target = format!("{}.{operation}", self.service.target_prefix);

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", &target);

        if let Some(signer) = &self.signer {
            let path = self.endpoint.path();
            let signed = signer.sign(
                &SignableRequest {
                    method: "POST",
                    host: &self.host,
                    path,
                    query: self.endpoint.query().unwrap_or_default(),
                    headers: &[("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())],
                    payload: &body,
                },
                chrono::Utc::now(),
            );
            for (name, value) in signed {
                builder = builder.header(name, value);
            }
        }

        let response = builder
            .body(body)
            .send()
            .await
            .map_err(|e| AwsError::RequestFailed {
                operation,
                details: e.to_string(),
            })?;

        let status = response.status();
        let error_type_header = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| AwsError::RequestFailed {
            operation,
            details: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let error = parse_error(operation, status.as_u16(), &bytes, error_type_header.as_deref());
            debug!(%error, "service returned error");
            return Err(error);
        }

        let payload: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(payload).map_err(|e| AwsError::InvalidResponse {
            operation,
            details: e.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

fn parse_error(operation: &'static str, status: u16, body: &[u8], header: Option<&str>) -> AwsError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let code = parsed
        .error_type
        .as_deref()
        .or(header)
        .map(error_code)
        .unwrap_or_default();

    AwsError::Service {
        operation,
        status,
        code,
        message: parsed.message.unwrap_or_default(),
    }
}

/// Strips the namespace (`aws.cognito#`) and trailing URI (`:http://...`)
/// that services may wrap around an error code.
fn error_code(raw: &str) -> String {
    let code = raw.rsplit('#').next().unwrap_or(raw);
    let code = code.split(':').next().unwrap_or(code);
    code.trim().to_string()
}
