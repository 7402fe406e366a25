//! The Lambda runtime API client and invocation loop.
//!
//! A custom runtime long-polls `invocation/next`, runs the handler, and
//! posts either the result or an error payload for the request id. Failures
//! before the first poll go to `init/error` instead.

use crate::error::{ErrorPayload, RuntimeError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use storefront_core::Result;
use tracing::{Instrument, debug, error, info_span};

/// Version prefix of every runtime API path.
pub const API_VERSION: &str = "2018-06-01";

const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
const ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";

/// One event handed to the function.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub request_id: String,
    /// When the platform will stop the invocation.
    pub deadline: Option<DateTime<Utc>>,
    pub payload: JsonValue,
}

impl Invocation {
    /// Time left before the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline
            .map(|deadline| (deadline - now).to_std().unwrap_or(Duration::ZERO))
    }
}

/// What a poll of `invocation/next` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum NextInvocation {
    Ready(Invocation),
    /// The event could not be decoded; the request id is kept so the
    /// failure can still be posted for it.
    Undecodable {
        request_id: String,
        error: RuntimeError,
    },
}

/// A function served by the runtime loop.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name `_HANDLER` selects this function by.
    fn name(&self) -> &'static str;

    /// Handles one invocation. An error is reported to the platform as a
    /// failed invocation.
    async fn handle(&self, invocation: &Invocation) -> std::result::Result<JsonValue, ErrorPayload>;
}

/// Client for the runtime API at `AWS_LAMBDA_RUNTIME_API`.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    http: reqwest::Client,
    base: String,
}

impl RuntimeClient {
    /// Creates a client for the runtime API at `host:port`.
    #[must_use]
    pub fn new(http: reqwest::Client, runtime_api: &str) -> Self {
        Self {
            http,
            base: format!("http://{runtime_api}/{API_VERSION}/runtime"),
        }
    }

    /// Waits for the next invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or lacks a request id. An event
    /// that is not JSON is returned as [`NextInvocation::Undecodable`].
    pub async fn next_invocation(&self) -> Result<NextInvocation, RuntimeError> {
        let response = self
            .http
            .get(format!("{}/invocation/next", self.base))
            .send()
            .await
            .map_err(|e| RuntimeError::Api {
                endpoint: "next",
                details: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RuntimeError::Api {
                endpoint: "next",
                details: format!("unexpected status {}", response.status()),
            }
            .into());
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let request_id = header(REQUEST_ID_HEADER).ok_or_else(|| RuntimeError::InvalidInvocation {
            details: "missing request id header".to_string(),
        })?;
        let deadline = header(DEADLINE_HEADER)
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        let body = response.bytes().await.map_err(|e| RuntimeError::Api {
            endpoint: "next",
            details: e.to_string(),
        })?;

        match serde_json::from_slice::<JsonValue>(&body) {
            Ok(payload) => Ok(NextInvocation::Ready(Invocation {
                request_id,
                deadline,
                payload,
            })),
            Err(e) => Ok(NextInvocation::Undecodable {
                request_id,
                error: RuntimeError::InvalidInvocation {
                    details: format!("event is not JSON: {e}"),
                },
            }),
        }
    }

    /// Posts the result of an invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime API does not accept it.
    pub async fn post_response(&self, request_id: &str, body: &JsonValue) -> Result<(), RuntimeError> {
        self.post(
            "response",
            format!("{}/invocation/{request_id}/response", self.base),
            body,
            None,
        )
        .await
    }

    /// Reports a failed invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime API does not accept it.
    pub async fn post_error(&self, request_id: &str, error: &ErrorPayload) -> Result<(), RuntimeError> {
        self.post(
            "error",
            format!("{}/invocation/{request_id}/error", self.base),
            error,
            Some(error.error_type.as_str()),
        )
        .await
    }

    /// Reports a failure to start the function.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime API does not accept it.
    pub async fn post_init_error(&self, error: &ErrorPayload) -> Result<(), RuntimeError> {
        self.post(
            "init/error",
            format!("{}/init/error", self.base),
            error,
            Some(error.error_type.as_str()),
        )
        .await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        url: String,
        body: &B,
        error_type: Option<&str>,
    ) -> Result<(), RuntimeError> {
        let mut request = self.http.post(url).json(body);
        if let Some(error_type) = error_type {
            request = request.header(ERROR_TYPE_HEADER, error_type);
        }

        let response = request.send().await.map_err(|e| RuntimeError::Api {
            endpoint,
            details: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(RuntimeError::Api {
                endpoint,
                details: format!("unexpected status {}", response.status()),
            }
            .into());
        }
        Ok(())
    }
}

/// Serves invocations until the runtime API fails.
///
/// # Errors
///
/// Returns the first runtime API error.
pub async fn run<H>(client: &RuntimeClient, handler: &H) -> Result<(), RuntimeError>
where
    H: Handler + ?Sized,
{
    loop {
        run_once(client, handler).await?;
    }
}

/// Fetches, handles and answers a single invocation.
///
/// # Errors
///
/// Returns an error if the runtime API fails; handler failures and events
/// that cannot be decoded are posted as invocation errors and are not
/// errors here.
pub async fn run_once<H>(client: &RuntimeClient, handler: &H) -> Result<(), RuntimeError>
where
    H: Handler + ?Sized,
{
    let invocation = match client.next_invocation().await? {
        NextInvocation::Ready(invocation) => invocation,
        NextInvocation::Undecodable { request_id, error } => {
            error!(%request_id, error = %error, "invocation event is not readable");
            return client
                .post_error(&request_id, &ErrorPayload::from(&error))
                .await;
        }
    };
    let span = info_span!(
        "invocation",
        handler = handler.name(),
        request_id = %invocation.request_id
    );

    async {
        match handler.handle(&invocation).await {
            Ok(body) => {
                debug!("invocation succeeded");
                client.post_response(&invocation.request_id, &body).await
            }
            Err(payload) => {
                error!(
                    error_type = %payload.error_type,
                    error = %payload.error_message,
                    "invocation failed"
                );
                client.post_error(&invocation.request_id, &payload).await
            }
        }
    }
    .instrument(span)
    .await
}
