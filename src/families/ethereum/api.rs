//! Ethereum chain client.
//!
//! # Responsibilities
//! - Query chain state over JSON-RPC (balance, nonce, height, gas price, receipts)
//! - Fail over across the configured RPC endpoints, each call under a deadline
//! - Read history from an Etherscan-compatible explorer through [`NetworkClient`]
//! - Submit raw signed transactions

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::{RpcError, TransportError, TransportErrorKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::account::{parse_decimal, Amount};
use crate::bridge::transaction::SignedOperation;
use crate::chain::{
    ChainApiClient, Confirmation, NetworkConfig, RawTransaction, RawTransactionStatus, SubmitReceipt,
};
use crate::config::EthereumConfig;
use crate::families::ethereum::family::{normalize_address, BASE_GAS_LIMIT};
use crate::network::{NetworkClient, NetworkError, NetworkResult};
use crate::observability::metrics;

/// Decimal places of ether.
const ETHER_DECIMALS: u32 = 18;

/// Explorer message for an address without history.
const NO_TRANSACTIONS: &str = "No transactions found";

/// Status reported for JSON-RPC error responses, which carry no HTTP status.
const RPC_REJECTION_STATUS: u16 = 400;

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerTransaction {
    hash: String,
    #[serde(default)]
    block_number: String,
    #[serde(default)]
    block_hash: String,
    time_stamp: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
    #[serde(default)]
    gas_used: String,
    #[serde(default)]
    gas_price: String,
    #[serde(default)]
    nonce: String,
    #[serde(default)]
    is_error: String,
    #[serde(default, rename = "txreceipt_status")]
    receipt_status: String,
}

struct Endpoint {
    provider: Arc<dyn Provider + Send + Sync>,
    url: String,
    host: String,
}

/// Ethereum client with RPC failover and explorer-backed history.
pub struct EthereumApi {
    /// Primary first, then failovers.
    endpoints: Vec<Endpoint>,
    explorer: NetworkClient,
    explorer_url: String,
    config: EthereumConfig,
    timeout_duration: Duration,
}

impl EthereumApi {
    /// Build the client. Only the primary RPC URL is required to parse;
    /// invalid failover URLs are skipped.
    pub fn new(config: &EthereumConfig, explorer: NetworkClient) -> NetworkResult<Self> {
        let primary = endpoint(&config.rpc_url).ok_or_else(|| {
            NetworkError::InvalidRequest(format!("Invalid RPC URL '{}'", config.rpc_url))
        })?;
        let mut endpoints = vec![primary];

        for url in &config.failover_urls {
            match endpoint(url) {
                Some(ep) => endpoints.push(ep),
                None => tracing::warn!(url = %url, "Ignoring invalid failover RPC URL"),
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = endpoints.len() - 1,
            chain_id = config.chain_id,
            "Ethereum client initialized"
        );

        Ok(Self {
            endpoints,
            explorer,
            explorer_url: config.explorer_url.clone(),
            config: config.clone(),
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> NetworkResult<u64> {
        let chain_id = self
            .rpc("eth_chainId", true, |p| async move { p.get_chain_id().await })
            .await?;
        if chain_id != self.config.chain_id {
            return Err(NetworkError::InvalidResponse {
                url: self.config.rpc_url.clone(),
                reason: format!("chain id {} does not match configured {}", chain_id, self.config.chain_id),
            });
        }
        Ok(chain_id)
    }

    /// Run `call` against each endpoint in turn until one answers.
    ///
    /// A JSON-RPC rejection moves on to the next endpoint only when
    /// `failover_on_rejection` is set.
    async fn rpc<T, F, Fut>(&self, method: &'static str, failover_on_rejection: bool, call: F) -> NetworkResult<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, TransportError>> + Send,
        T: Send,
    {
        let mut last_error = None;

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let start = Instant::now();
            let err = match timeout(self.timeout_duration, call(endpoint.provider.clone())).await {
                Ok(Ok(result)) => {
                    metrics::record_request(method, "success", &endpoint.host, start);
                    return Ok(result);
                }
                Ok(Err(e)) => classify(&endpoint.url, e),
                Err(_) => NetworkError::Down {
                    url: endpoint.url.clone(),
                },
            };

            metrics::record_request(method, err.kind(), &endpoint.host, start);
            tracing::warn!(provider_idx = i, method = method, error = %err, "RPC call failed");

            let rejected = matches!(err, NetworkError::ClientError { .. });
            last_error = Some(err);
            if rejected && !failover_on_rejection {
                break;
            }
        }

        Err(last_error.unwrap_or_else(|| NetworkError::Down {
            url: self.config.rpc_url.clone(),
        }))
    }

    fn explorer_query(&self, query: &str) -> String {
        let separator = if self.explorer_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.explorer_url, separator, query)
    }

    fn history_url(&self, address: &str, start_block: u64) -> String {
        self.explorer_query(&format!(
            "module=account&action=txlist&address={}&startblock={}&sort=desc",
            address, start_block
        ))
    }

    fn block_by_time_url(&self, timestamp: i64) -> String {
        self.explorer_query(&format!(
            "module=block&action=getblocknobytime&timestamp={}&closest=after",
            timestamp
        ))
    }

    /// First block at or after `since`, so an incremental fetch skips older blocks.
    ///
    /// The explorer has no such block when `since` is newer than the chain
    /// head; the head is used then.
    async fn start_block(&self, since: Option<DateTime<Utc>>) -> NetworkResult<u64> {
        let Some(since) = since else {
            return Ok(0);
        };

        let url = self.block_by_time_url(since.timestamp().max(0));
        let response: ExplorerResponse = self.explorer.get_json(&url).await?;
        if response.status != "1" {
            tracing::debug!(url = %url, message = %response.message, "No block after cursor, using chain head");
            return self.get_block_height().await;
        }

        let block = match &response.result {
            serde_json::Value::String(number) => number.parse::<u64>().ok(),
            serde_json::Value::Number(number) => number.as_u64(),
            _ => None,
        };
        block.ok_or_else(|| invalid(&url, format!("block number '{}' is not numeric", response.result)))
    }
}

fn endpoint(url: &str) -> Option<Endpoint> {
    let parsed: url::Url = url.parse().ok()?;
    let host = parsed.host_str().unwrap_or("unknown").to_string();
    Some(Endpoint {
        provider: Arc::new(ProviderBuilder::new().connect_http(parsed)) as Arc<dyn Provider + Send + Sync>,
        url: url.to_string(),
        host,
    })
}

/// Map an alloy transport failure onto the shared network error classes.
fn classify(url: &str, err: TransportError) -> NetworkError {
    if let Some(payload) = err.as_error_resp() {
        return NetworkError::ClientError {
            status: RPC_REJECTION_STATUS,
            message: format!("{} (code {})", payload.message, payload.code),
            url: url.to_string(),
        };
    }
    match err {
        RpcError::Transport(TransportErrorKind::HttpError(http)) => {
            NetworkError::from_status(http.status, &http.body, url)
        }
        RpcError::Transport(_) => NetworkError::Down { url: url.to_string() },
        other => NetworkError::InvalidResponse {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

fn invalid(url: &str, reason: String) -> NetworkError {
    NetworkError::InvalidResponse {
        url: url.to_string(),
        reason,
    }
}

fn explorer_to_raw(url: &str, tx: ExplorerTransaction) -> NetworkResult<RawTransaction> {
    let amount = |field: &str, value: &str| {
        if value.is_empty() {
            return Ok(Amount::ZERO);
        }
        parse_decimal(value).ok_or_else(|| invalid(url, format!("{} is not a decimal amount: '{}'", field, value)))
    };
    let integer = |field: &str, value: &str| {
        if value.is_empty() {
            return Ok(0u64);
        }
        value
            .parse::<u64>()
            .map_err(|_| invalid(url, format!("{} is not an integer: '{}'", field, value)))
    };

    let seconds = integer("timeStamp", &tx.time_stamp)?;
    let timestamp = i64::try_from(seconds)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .ok_or_else(|| invalid(url, format!("timestamp {} out of range", seconds)))?;

    let block_number = integer("blockNumber", &tx.block_number)?;
    let (block_height, block_hash) = if block_number == 0 || tx.block_hash.is_empty() {
        (None, None)
    } else {
        (Some(block_number), Some(tx.block_hash))
    };

    let status = if block_height.is_none() {
        RawTransactionStatus::Pending
    } else if tx.is_error == "1" || tx.receipt_status == "0" {
        RawTransactionStatus::Fail
    } else {
        RawTransactionStatus::Success
    };

    Ok(RawTransaction {
        value: amount("value", &tx.value)?,
        fee: amount("gasUsed", &tx.gas_used)?.saturating_mul(amount("gasPrice", &tx.gas_price)?),
        nonce: integer("nonce", &tx.nonce)?,
        hash: tx.hash,
        sender: normalize_address(&tx.from),
        receiver: (!tx.to.is_empty()).then(|| normalize_address(&tx.to)),
        timestamp,
        block_height,
        block_hash,
        status,
    })
}

#[async_trait]
impl ChainApiClient for EthereumApi {
    async fn get_balance(&self, address: &str) -> NetworkResult<Amount> {
        let address = parse_address(address)?;
        self.rpc("eth_getBalance", true, move |p| async move { p.get_balance(address).await })
            .await
    }

    async fn get_sequence(&self, address: &str) -> NetworkResult<u64> {
        let address = parse_address(address)?;
        self.rpc("eth_getTransactionCount", true, move |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    async fn get_block_height(&self) -> NetworkResult<u64> {
        self.rpc("eth_blockNumber", true, |p| async move { p.get_block_number().await })
            .await
    }

    async fn get_network_config(&self) -> NetworkResult<NetworkConfig> {
        let chain_id = self.verify_chain_id().await?;
        let gas_price = self
            .rpc("eth_gasPrice", true, |p| async move { p.get_gas_price().await })
            .await?;
        let adjusted = (gas_price as f64 * self.config.gas_price_multiplier) as u128;

        Ok(NetworkConfig {
            chain_id: chain_id.to_string(),
            gas_price: Amount::from(adjusted),
            gas_limit: BASE_GAS_LIMIT,
            denomination: ETHER_DECIMALS,
        })
    }

    async fn get_history(
        &self,
        address: &str,
        since: Option<DateTime<Utc>>,
    ) -> NetworkResult<Vec<RawTransaction>> {
        let start_block = self.start_block(since).await?;
        let url = self.history_url(address, start_block);
        let response: ExplorerResponse = self.explorer.get_json(&url).await?;

        if response.status != "1" {
            if response.message.starts_with(NO_TRANSACTIONS) {
                return Ok(Vec::new());
            }
            let detail = response.result.as_str().unwrap_or(&response.message).to_string();
            return Err(invalid(&url, format!("explorer error: {}", detail)));
        }

        let entries: Vec<ExplorerTransaction> = serde_json::from_value(response.result)
            .map_err(|e| invalid(&url, e.to_string()))?;
        // Second resolution: the cursor's own second is fetched again and deduplicated.
        let since_secs = since.map(|s| s.timestamp());

        let mut history = Vec::with_capacity(entries.len());
        for entry in entries {
            let tx = explorer_to_raw(&url, entry)?;
            if since_secs.map_or(true, |s| tx.timestamp.timestamp() >= s) {
                history.push(tx);
            }
        }
        Ok(history)
    }

    async fn submit(&self, signed: &SignedOperation) -> NetworkResult<SubmitReceipt> {
        let raw = hex::decode(signed.signature.trim_start_matches("0x"))
            .map_err(|e| NetworkError::InvalidRequest(format!("signed transaction is not hex: {}", e)))?;

        let hash = self
            .rpc("eth_sendRawTransaction", false, move |p| {
                let raw = raw.clone();
                async move {
                    p.send_raw_transaction(&raw)
                        .await
                        .map(|pending| *pending.tx_hash())
                }
            })
            .await?;

        Ok(SubmitReceipt {
            hash: hash.to_string(),
        })
    }

    async fn get_confirmation(&self, hash: &str) -> NetworkResult<Option<Confirmation>> {
        let tx_hash = TxHash::from_str(hash)
            .map_err(|e| NetworkError::InvalidRequest(format!("invalid transaction hash '{}': {}", hash, e)))?;
        let receipt = self
            .rpc("eth_getTransactionReceipt", true, move |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;

        Ok(receipt.and_then(|r| match (r.block_number, r.block_hash) {
            (Some(block_height), Some(block_hash)) => Some(Confirmation {
                block_height,
                block_hash: block_hash.to_string(),
            }),
            _ => None,
        }))
    }
}

fn parse_address(address: &str) -> NetworkResult<Address> {
    Address::from_str(address)
        .map_err(|e| NetworkError::InvalidRequest(format!("invalid address '{}': {}", address, e)))
}

impl std::fmt::Debug for EthereumApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumApi")
            .field("rpc_url", &self.config.rpc_url)
            .field("endpoints", &self.endpoints.len())
            .field("explorer_url", &self.explorer_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
