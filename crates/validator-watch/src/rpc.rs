//! NEAR node client over plain HTTP.
//!
//! `/status` and `/network_info` are GET endpoints served next to the
//! JSON-RPC root; the validator set comes from the `validators` RPC method.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WatchError;
use crate::fetcher::{EpochValidatorInfo, NetworkInfo, NodeStatus, NodeStatusFetcher};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<serde_json::Value>,
}

/// [`NodeStatusFetcher`] backed by a node's HTTP endpoint.
pub struct NearRpcClient {
    http: reqwest::Client,
    base_url: String,
}

impl NearRpcClient {
    /// Every request is bounded by `timeout`; expiry surfaces as a fetch failure.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WatchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WatchError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        call: &'static str,
        path: &str,
    ) -> Result<T, WatchError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WatchError::fetch(call, e))?;
        decode(call, resp).await
    }

    async fn call_rpc<T: serde::de::DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> Result<T, WatchError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: "dontcare",
            method,
            params,
        };

        let resp = self
            .http
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WatchError::fetch(method, e))?;

        let body: JsonRpcResponse<T> = decode(method, resp).await?;
        match (body.result, body.error) {
            (_, Some(err)) => Err(WatchError::fetch(method, format!("RPC error: {err}"))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(WatchError::fetch(method, "response has neither result nor error")),
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    call: &'static str,
    resp: reqwest::Response,
) -> Result<T, WatchError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| WatchError::fetch(call, e))?;

    if !status.is_success() {
        return Err(WatchError::fetch(
            call,
            format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
        ));
    }

    serde_json::from_str(&body)
        .map_err(|e| WatchError::fetch(call, format!("malformed response: {e}")))
}

impl NodeStatusFetcher for NearRpcClient {
    async fn node_status(&self) -> Result<NodeStatus, WatchError> {
        self.get_json("status", "/status").await
    }

    async fn network_info(&self) -> Result<NetworkInfo, WatchError> {
        self.get_json("network_info", "/network_info").await
    }

    async fn validators(&self) -> Result<EpochValidatorInfo, WatchError> {
        self.call_rpc("validators", serde_json::json!([null])).await
    }
}
