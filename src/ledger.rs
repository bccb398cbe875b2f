//! Ledger Query Client
//!
//! The core never owns the chain; it queries an external node for balances
//! and history, and hands signed transactions over for submission. The
//! [`LedgerQueryClient`] trait is the seam: production code talks JSON-RPC
//! over HTTP through [`HttpLedgerClient`], tests plug in an in-memory ledger.
//!
//! Queries are read-only with respect to the wallet; dropping an in-flight
//! future simply abandons the request.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::keys::Address;
use crate::transaction::SignedTransaction;

/// Default timeout for RPC requests.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed port Ferrite nodes listen on for wallet RPC.
pub const NETWORK_PORT: u16 = 7341;

/// RPC error code a node returns for an address it has never seen.
const RPC_ADDRESS_NOT_FOUND: i32 = -32004;

/// JSON-RPC request ID counter.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Interface to the external ledger for balance and history queries.
///
/// Implementations may fail with [`LedgerError::Unreachable`] (network) or
/// [`LedgerError::NotFound`] (unknown address, which callers treat as zero
/// balance / empty history rather than an error).
#[async_trait]
pub trait LedgerQueryClient: Send + Sync {
    /// Current balance of `address` in nanofer.
    async fn query_balance(&self, address: &Address) -> Result<u64, LedgerError>;

    /// Transaction history of `address`, in the ledger's own order.
    async fn query_history(&self, address: &Address)
        -> Result<Vec<SignedTransaction>, LedgerError>;
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: String,
    params: Value,
    id: u64,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: u64,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[allow(dead_code)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct HistoryResult {
    transactions: Vec<SignedTransaction>,
}

#[derive(Debug, Deserialize)]
struct SubmitTxResult {
    tx_hash: String,
}

/// JSON-RPC client for a single Ferrite node.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    /// Connect to a node with the default timeout.
    pub fn new(addr: SocketAddr) -> Result<Self, LedgerError> {
        Self::with_timeout(addr, DEFAULT_RPC_TIMEOUT)
    }

    /// Connect to a node with a caller-specified request timeout.
    pub fn with_timeout(addr: SocketAddr, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: format!("http://{}", addr),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = REQUEST_ID.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(method, error = %e, "rpc transport failure");
                LedgerError::Unreachable(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(LedgerError::Unreachable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let json_response: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Unreachable(format!("invalid response body: {}", e)))?;

        debug!(method, latency_ms = start.elapsed().as_millis() as u64, "rpc call");

        if let Some(error) = json_response.error {
            if error.code == RPC_ADDRESS_NOT_FOUND {
                return Err(LedgerError::NotFound);
            }
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        json_response
            .result
            .ok_or_else(|| LedgerError::Unreachable("missing result in rpc response".to_string()))
    }

    /// Submit a transaction in the canonical wire format.
    ///
    /// Returns the node's acknowledgment hash; the response is not
    /// interpreted beyond success or failure.
    pub async fn submit_transaction(&self, tx_bytes: &[u8]) -> Result<String, LedgerError> {
        let result: SubmitTxResult = self
            .call("tx_submit", json!({ "tx_hex": hex::encode(tx_bytes) }))
            .await?;
        debug!(tx_hash = %result.tx_hash, "transaction submitted");
        Ok(result.tx_hash)
    }
}

#[async_trait]
impl LedgerQueryClient for HttpLedgerClient {
    async fn query_balance(&self, address: &Address) -> Result<u64, LedgerError> {
        let result: BalanceResult = self
            .call("wallet_getBalance", json!({ "address": address.to_string() }))
            .await?;
        Ok(result.balance)
    }

    async fn query_history(
        &self,
        address: &Address,
    ) -> Result<Vec<SignedTransaction>, LedgerError> {
        let result: HistoryResult = self
            .call("wallet_getHistory", json!({ "address": address.to_string() }))
            .await?;
        Ok(result.transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_base_url() {
        let addr: SocketAddr = format!("127.0.0.1:{}", NETWORK_PORT).parse().unwrap();
        let client = HttpLedgerClient::new(addr).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:7341");
    }

    #[tokio::test]
    async fn test_unreachable_node_reports_unreachable() {
        // Nothing listens on a fresh ephemeral-range port of localhost.
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let client = HttpLedgerClient::with_timeout(addr, Duration::from_millis(200)).unwrap();
        let address = crate::keys::KeyPair::generate().address();
        match client.query_balance(&address).await {
            Err(LedgerError::Unreachable(_)) => {}
            other => panic!("expected Unreachable, got {:?}", other.map(|_| ())),
        }
    }
}
