//! HTTP implementation of the runtime collaborator traits.
//!
//! [`HttpBackend`] speaks the DevTrace backend's JSON API: `/analyze`,
//! `/flow`, `/trace/*`, `/hotswap`, `/ai/suggestFix`,
//! `/code/applySuggestion`, `/instrumentation/*`, and the `/live` SSE
//! stream. One instance serves both [`RuntimeClient`] and
//! [`LiveEventSource`].

use std::path::Path;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use devtrace_core::context::ProviderConfig;
use devtrace_core::events::RawLiveEvent;
use devtrace_core::results::{
    AiSuggestion, AnalysisResult, FlowResult, HotswapResult, TraceResult,
};
use devtrace_runtime::client::{
    ClientError, ClientResult, LiveEventSource, LiveEventStream, RuntimeClient,
};

use crate::config::BackendConfig;
use crate::errors::BackendError;
use crate::wire::{
    AnalyzeRequest, ApiErrorBody, AppliedResponse, ApplySuggestionRequest, FlowRequest,
    HotswapAction, HotswapRequest, SuggestFixRequest, SuggestionsResponse, TraceSessionRequest,
    TraceStarted,
};

/// HTTP adapter for the DevTrace runtime backend.
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend adapter with its own HTTP client.
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a backend adapter with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: BackendConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Turn a non-success response into [`BackendError::Api`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let fallback = status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            message: body.into_message(&fallback),
        })
    }

    /// POST `body` and decode the JSON response, bounded by the request
    /// timeout.
    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        debug!(path, "backend request");
        let response = self
            .client
            .post(self.url(path))
            .timeout(self.config.request_timeout)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST with an empty body, ignoring the response payload.
    async fn post_empty(&self, path: &str) -> Result<(), BackendError> {
        debug!(path, "backend request");
        let response = self
            .client
            .post(self.url(path))
            .timeout(self.config.request_timeout)
            .json(&json!({}))
            .send()
            .await?;
        let _ = Self::check(response).await?;
        Ok(())
    }

    async fn hotswap_request(
        &self,
        action: HotswapAction,
        state_id: &str,
        new_code: Option<&str>,
    ) -> ClientResult<HotswapResult> {
        let result = self
            .post_json("/hotswap", &HotswapRequest {
                action,
                state_id: state_id.to_string(),
                new_code: new_code.map(ToString::to_string),
            })
            .await?;
        Ok(result)
    }

    /// Long-poll the result of a running trace session. No request timeout;
    /// the session ends when the tracer says so.
    async fn trace_result(&self, session_id: &str) -> Result<TraceResult, BackendError> {
        let response = self
            .client
            .post(self.url("/trace/result"))
            .json(&TraceSessionRequest {
                session_id: session_id.to_string(),
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl RuntimeClient for HttpBackend {
    #[instrument(skip(self))]
    async fn analyze(&self, file: &Path) -> ClientResult<AnalysisResult> {
        let result = self
            .post_json("/analyze", &AnalyzeRequest {
                file_path: file.to_string_lossy().into_owned(),
            })
            .await?;
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn generate_flow(&self, function_name: &str) -> ClientResult<FlowResult> {
        let result = self
            .post_json("/flow", &FlowRequest {
                function_name: function_name.to_string(),
            })
            .await?;
        Ok(result)
    }

    #[instrument(skip_all)]
    async fn start_trace(&self, cancel: CancellationToken) -> ClientResult<TraceResult> {
        let started: TraceStarted = self.post_json("/trace/start", &json!({})).await?;
        let session_id = started.session_id;
        debug!(%session_id, "trace session started");

        tokio::select! {
            () = cancel.cancelled() => {}
            result = self.trace_result(&session_id) => return Ok(result?),
        }

        debug!(%session_id, "stopping trace session");
        let stopped: TraceResult = self
            .post_json("/trace/stop", &TraceSessionRequest { session_id })
            .await?;
        Ok(stopped)
    }

    #[instrument(skip(self, new_code))]
    async fn perform_hotswap(&self, state_id: &str, new_code: &str) -> ClientResult<HotswapResult> {
        self.hotswap_request(HotswapAction::Swap, state_id, Some(new_code))
            .await
    }

    #[instrument(skip(self))]
    async fn rollback(&self, state_id: &str) -> ClientResult<HotswapResult> {
        self.hotswap_request(HotswapAction::Rollback, state_id, None)
            .await
    }

    #[instrument(skip(self, new_code))]
    async fn apply_fix(&self, state_id: &str, new_code: &str) -> ClientResult<HotswapResult> {
        self.hotswap_request(HotswapAction::ApplyFix, state_id, Some(new_code))
            .await
    }

    #[instrument(skip(self))]
    async fn play_forward(&self, state_id: &str) -> ClientResult<HotswapResult> {
        self.hotswap_request(HotswapAction::PlayForward, state_id, None)
            .await
    }

    #[instrument(skip_all, fields(provider = ?config.provider))]
    async fn fetch_suggestions(
        &self,
        error_message: &str,
        file: &Path,
        config: &ProviderConfig,
    ) -> ClientResult<Vec<AiSuggestion>> {
        let response: SuggestionsResponse = self
            .post_json("/ai/suggestFix", &SuggestFixRequest {
                error_message: error_message.to_string(),
                file_path: file.to_string_lossy().into_owned(),
                provider: config.provider,
                api_key: (!config.api_key.is_empty()).then(|| config.api_key.clone()),
            })
            .await?;
        Ok(response.suggestions)
    }

    #[instrument(skip(self, suggestion), fields(suggestion_id = %suggestion.id))]
    async fn apply_suggestion(&self, file: &Path, suggestion: &AiSuggestion) -> ClientResult<bool> {
        let response: AppliedResponse = self
            .post_json("/code/applySuggestion", &ApplySuggestionRequest {
                file_path: file.to_string_lossy().into_owned(),
                suggestion: suggestion.clone(),
            })
            .await?;
        Ok(response.applied)
    }

    async fn start_instrumentation(&self) -> ClientResult<()> {
        Ok(self.post_empty("/instrumentation/start").await?)
    }

    async fn stop_instrumentation(&self) -> ClientResult<()> {
        Ok(self.post_empty("/instrumentation/stop").await?)
    }
}

#[async_trait]
impl LiveEventSource for HttpBackend {
    #[instrument(skip_all)]
    async fn subscribe(&self) -> ClientResult<LiveEventStream> {
        let response = self
            .client
            .get(self.url("/live"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(BackendError::Http)?;
        let response = Self::check(response).await?;
        debug!("live event stream connected");

        let stream = response.bytes_stream().eventsource().map(|item| match item {
            Ok(event) => serde_json::from_str::<RawLiveEvent>(&event.data)
                .map_err(|e| Box::new(BackendError::Decode(e)) as ClientError),
            Err(e) => Err(Box::new(BackendError::Stream(e.to_string())) as ClientError),
        });
        Ok(stream.boxed())
    }
}
