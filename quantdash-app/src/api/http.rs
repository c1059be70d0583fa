//! HTTP implementation of [`ApiClient`] over blocking `reqwest`.
//!
//! All requests are JSON. A bearer token is attached when configured. Status
//! handling:
//! - 404 → [`ApiError::NotFound`]
//! - other non-2xx → [`ApiError::Status`], with the server's `detail` field
//!   as the message when the body carries one
//! - connect/timeout failures → [`ApiError::Network`]
//!
//! No retries: a failed call is terminal for the action that issued it.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quantdash_core::chart::Interval;
use quantdash_core::domain::{
    Backtest, Candle, CreateBacktestRequest, CreateOptimizationRequest, CryptoPrice,
    DataQualityAlert, MlModel, Optimization, PromptEvaluation, PromptTemplate, Quote,
    ReviewDecision, TrainModelRequest, Watchlist, WatchlistRequest,
};
use quantdash_core::indicators::{IndicatorSpec, OverlaySet};

use super::{ApiClient, ApiError};
use crate::config::ApiConfig;

/// Error body shape used by the backend (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Backend client.
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ApiError::Config(format!("bad base url '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base url '{}' cannot carry a path",
                config.base_url
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("quantdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments (each percent-encoded) and query pairs.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments, query);
        decode(check_status(self.request(Method::GET, url).send()?)?)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments, &[]);
        let mut builder = self.request(Method::POST, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        decode(check_status(builder.send()?)?)
    }

    fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments, &[]);
        decode(check_status(self.request(Method::PUT, url).json(body).send()?)?)
    }

    fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        let url = self.endpoint(segments, &[]);
        check_status(self.request(Method::DELETE, url).send()?)?;
        Ok(())
    }

    fn prompt_action<T: DeserializeOwned>(
        &self,
        prompt_id: &str,
        version: u32,
        action: &str,
        decision: Option<&ReviewDecision>,
    ) -> Result<T, ApiError> {
        let version = version.to_string();
        self.post(&["prompts", prompt_id, "versions", version.as_str(), action], decision)
    }
}

/// Map non-success statuses to errors, passing successful responses through.
fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let path = resp.url().path().to_string();
    let body = resp.text().unwrap_or_default();
    tracing::debug!(status = status.as_u16(), path = %path, "request failed");
    Err(status_error(status, path, &body))
}

/// Error for a non-success `status` on `path`.
fn status_error(status: StatusCode, path: String, body: &str) -> ApiError {
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(path);
    }
    ApiError::Status {
        status: status.as_u16(),
        message: error_message(body, status),
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let path = resp.url().path().to_string();
    resp.json()
        .map_err(|e| ApiError::Decode(format!("failed to parse response from {path}: {e}")))
}

impl ApiClient for HttpApiClient {
    fn list_backtests(&self) -> Result<Vec<Backtest>, ApiError> {
        self.get(&["backtests"], &[])
    }

    fn get_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        self.get(&["backtests", id], &[])
    }

    fn create_backtest(&self, request: &CreateBacktestRequest) -> Result<Backtest, ApiError> {
        self.post(&["backtests"], Some(request))
    }

    fn execute_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        self.post::<(), _>(&["backtests", id, "execute"], None)
    }

    fn cancel_backtest(&self, id: &str) -> Result<Backtest, ApiError> {
        self.post::<(), _>(&["backtests", id, "cancel"], None)
    }

    fn delete_backtest(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["backtests", id])
    }

    fn create_optimization(
        &self,
        request: &CreateOptimizationRequest,
    ) -> Result<Optimization, ApiError> {
        self.post(&["optimizations"], Some(request))
    }

    fn start_optimization(&self, id: &str) -> Result<Optimization, ApiError> {
        self.post::<(), _>(&["optimizations", id, "start"], None)
    }

    fn list_watchlists(&self) -> Result<Vec<Watchlist>, ApiError> {
        self.get(&["watchlists"], &[])
    }

    fn get_watchlist(&self, id: &str) -> Result<Watchlist, ApiError> {
        self.get(&["watchlists", id], &[])
    }

    fn create_watchlist(&self, request: &WatchlistRequest) -> Result<Watchlist, ApiError> {
        self.post(&["watchlists"], Some(request))
    }

    fn update_watchlist(
        &self,
        id: &str,
        request: &WatchlistRequest,
    ) -> Result<Watchlist, ApiError> {
        self.put(&["watchlists", id], request)
    }

    fn delete_watchlist(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&["watchlists", id])
    }

    fn get_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        self.get(&["market-data", "quote", symbol], &[])
    }

    fn get_intraday(&self, symbol: &str, interval: Interval) -> Result<Vec<Candle>, ApiError> {
        self.get(
            &["market-data", "intraday", symbol],
            &[("interval", interval.as_str().to_string())],
        )
    }

    fn get_crypto_prices(&self, symbols: &[String]) -> Result<Vec<CryptoPrice>, ApiError> {
        self.get(&["market-data", "crypto"], &[("symbols", symbols.join(","))])
    }

    fn get_technical_indicators(
        &self,
        symbol: &str,
        interval: Interval,
        specs: &[IndicatorSpec],
    ) -> Result<OverlaySet, ApiError> {
        let indicators: Vec<String> = specs.iter().map(ToString::to_string).collect();
        self.get(
            &["market-data", "indicators", symbol],
            &[
                ("interval", interval.as_str().to_string()),
                ("indicators", indicators.join(";")),
            ],
        )
    }

    fn list_alerts(&self, symbol: Option<&str>) -> Result<Vec<DataQualityAlert>, ApiError> {
        let query: Vec<(&str, String)> = symbol
            .map(|s| ("symbol", s.to_string()))
            .into_iter()
            .collect();
        self.get(&["data-quality", "alerts"], &query)
    }

    fn list_models(&self) -> Result<Vec<MlModel>, ApiError> {
        self.get(&["models"], &[])
    }

    fn train_model(&self, request: &TrainModelRequest) -> Result<MlModel, ApiError> {
        self.post(&["models", "train"], Some(request))
    }

    fn delete_model(&self, version: &str) -> Result<(), ApiError> {
        self.delete(&["models", version])
    }

    fn list_prompts(&self) -> Result<Vec<PromptTemplate>, ApiError> {
        self.get(&["prompts"], &[])
    }

    fn submit_prompt(&self, prompt_id: &str, version: u32) -> Result<PromptTemplate, ApiError> {
        self.prompt_action(prompt_id, version, "submit", None)
    }

    fn approve_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        decision: &ReviewDecision,
    ) -> Result<PromptTemplate, ApiError> {
        self.prompt_action(prompt_id, version, "approve", Some(decision))
    }

    fn reject_prompt(
        &self,
        prompt_id: &str,
        version: u32,
        decision: &ReviewDecision,
    ) -> Result<PromptTemplate, ApiError> {
        self.prompt_action(prompt_id, version, "reject", Some(decision))
    }

    fn evaluate_prompt(
        &self,
        prompt_id: &str,
        version: u32,
    ) -> Result<PromptEvaluation, ApiError> {
        self.prompt_action(prompt_id, version, "evaluate", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpApiClient {
        HttpApiClient::new(&ApiConfig {
            base_url: base.to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_and_encodes_segments() {
        let c = client("http://localhost:8000/api/v1/");
        assert_eq!(
            c.endpoint(&["backtests", "bt-1", "execute"], &[]).as_str(),
            "http://localhost:8000/api/v1/backtests/bt-1/execute"
        );
        assert_eq!(
            c.endpoint(&["market-data", "quote", "BTC/USD"], &[]).as_str(),
            "http://localhost:8000/api/v1/market-data/quote/BTC%2FUSD"
        );
    }

    #[test]
    fn endpoint_without_trailing_slash() {
        let c = client("http://localhost:8000/api/v1");
        let url = c.endpoint(
            &["market-data", "intraday", "AAPL"],
            &[("interval", "5m".to_string())],
        );
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/market-data/intraday/AAPL?interval=5m"
        );
    }

    #[test]
    fn bad_base_url_is_config_error() {
        let err = HttpApiClient::new(&ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn error_messages_prefer_detail() {
        assert_eq!(
            error_message(r#"{"detail":"name already taken"}"#, StatusCode::CONFLICT),
            "name already taken"
        );
        assert_eq!(
            error_message(
                r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#,
                StatusCode::UNPROCESSABLE_ENTITY
            ),
            r#"[{"loc":["body","name"],"msg":"field required"}]"#
        );
        assert_eq!(error_message("upstream timeout", StatusCode::BAD_GATEWAY), "upstream timeout");
        assert_eq!(
            error_message("", StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
    }

    #[test]
    fn not_found_carries_the_path() {
        let err = status_error(
            StatusCode::NOT_FOUND,
            "/api/v1/backtests/bt-9".into(),
            r#"{"detail":"Backtest not found"}"#,
        );
        assert_eq!(err, ApiError::NotFound("/api/v1/backtests/bt-9".into()));
        assert!(err.is_not_found());
    }

    #[test]
    fn server_error_uses_detail() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "/api/v1/backtests".into(),
            r#"{"detail":"boom"}"#,
        );
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn empty_error_body_falls_back_to_reason() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "/api/v1/models".into(), "");
        assert_eq!(
            err,
            ApiError::Status {
                status: 503,
                message: "Service Unavailable".into()
            }
        );
    }

    /// Serve one canned HTTP response on a local port and return the base url.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}/api/v1")
    }

    /// Client for a local test server, ignoring any proxy set in the environment.
    fn local_client(base: &str) -> HttpApiClient {
        HttpApiClient {
            client: Client::builder().no_proxy().build().unwrap(),
            base_url: Url::parse(base).unwrap(),
            token: None,
        }
    }

    #[test]
    fn live_server_error_maps_to_status() {
        let c = local_client(&serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#));
        assert_eq!(
            c.list_backtests().unwrap_err(),
            ApiError::Status {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn live_not_found_maps_to_not_found() {
        let c = local_client(&serve_once("404 Not Found", ""));
        assert_eq!(
            c.get_backtest("bt-9").unwrap_err(),
            ApiError::NotFound("/api/v1/backtests/bt-9".into())
        );
    }

    #[test]
    fn unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let c = HttpApiClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:9/api/v1".into(),
            timeout_secs: 2,
            token: None,
        })
        .unwrap();
        let err = c.list_backtests().unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    }
}
