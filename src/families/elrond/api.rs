//! Elrond public API and gateway client.
//!
//! # Endpoints
//! ```text
//! GET  {api}/accounts/{address}                   balance, nonce
//! GET  {api}/network/config                       chain id, gas price/limit, denomination
//! GET  {api}/transactions?condition=should&...    history for sender or receiver
//! POST {api}/transaction/send                     signed submission
//! GET  {gateway}/transaction/{hash}               hyperblock nonce and hash
//! GET  {gateway}/network/status/{metachain}       current hyperblock nonce
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::account::{parse_decimal, Amount};
use crate::bridge::transaction::SignedOperation;
use crate::chain::{
    ChainApiClient, Confirmation, NetworkConfig, RawTransaction, RawTransactionStatus, SubmitReceipt,
};
use crate::config::ElrondConfig;
use crate::network::{NetworkClient, NetworkError, NetworkResult};

/// Shard id of the metachain, whose nonce is the hyperblock height.
const METACHAIN_SHARD: u32 = 4_294_967_295;

const TRANSACTION_VERSION: u32 = 2;
const TRANSACTION_OPTIONS: u32 = 1;

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    balance: Option<String>,
    #[serde(default)]
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct NetworkConfigResponse {
    data: NetworkConfigData,
}

#[derive(Debug, Deserialize)]
struct NetworkConfigData {
    config: NetworkConfigFields,
}

#[derive(Debug, Deserialize)]
struct NetworkConfigFields {
    erd_chain_id: String,
    erd_denomination: u32,
    erd_min_gas_limit: u64,
    erd_min_gas_price: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry {
    tx_hash: String,
    sender: String,
    #[serde(default)]
    receiver: Option<String>,
    value: String,
    #[serde(default)]
    fee: Option<String>,
    timestamp: i64,
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayTransactionResponse {
    data: GatewayTransactionData,
}

#[derive(Debug, Deserialize)]
struct GatewayTransactionData {
    transaction: GatewayTransaction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayTransaction {
    #[serde(default)]
    hyperblock_nonce: u64,
    #[serde(default)]
    block_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NetworkStatusResponse {
    data: NetworkStatusData,
}

#[derive(Debug, Deserialize)]
struct NetworkStatusData {
    status: NetworkStatusFields,
}

#[derive(Debug, Deserialize)]
struct NetworkStatusFields {
    erd_nonce: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    nonce: u64,
    value: String,
    receiver: &'a str,
    sender: &'a str,
    gas_price: u64,
    gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
    #[serde(rename = "chainID")]
    chain_id: &'a str,
    version: u32,
    options: u32,
    signature: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    data: SendData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendData {
    #[serde(default)]
    tx_hash: Option<String>,
}

/// Elrond chain client over [`NetworkClient`].
#[derive(Debug, Clone)]
pub struct ElrondApi {
    client: NetworkClient,
    api_url: String,
    gateway_url: String,
}

impl ElrondApi {
    pub fn new(client: NetworkClient, config: &ElrondConfig) -> Self {
        let api_url = config.api_url.trim_end_matches('/').to_string();
        let gateway_url = config
            .gateway_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| api_url.clone());
        Self {
            client,
            api_url,
            gateway_url,
        }
    }

    async fn get_account(&self, address: &str) -> NetworkResult<AccountResponse> {
        let url = format!("{}/accounts/{}", self.api_url, address);
        match self.client.get_json::<AccountResponse>(&url).await {
            Ok(account) => Ok(account),
            // Never-used addresses are unknown to some API versions.
            Err(NetworkError::ClientError { status: 404, .. }) => Ok(AccountResponse {
                balance: None,
                nonce: 0,
            }),
            Err(err) => Err(err),
        }
    }

    async fn get_confirmed_transaction(&self, hash: &str) -> NetworkResult<Option<Confirmation>> {
        let url = format!("{}/transaction/{}", self.gateway_url, hash);
        let response: GatewayTransactionResponse = self.client.get_json(&url).await?;
        let tx = response.data.transaction;
        Ok(match (tx.hyperblock_nonce, tx.block_hash) {
            (0, _) | (_, None) => None,
            (block_height, Some(block_hash)) => Some(Confirmation {
                block_height,
                block_hash,
            }),
        })
    }

    async fn to_raw_transaction(&self, url: &str, entry: HistoryEntry) -> NetworkResult<RawTransaction> {
        let status = entry
            .status
            .as_deref()
            .map(parse_status)
            .unwrap_or(RawTransactionStatus::Unknown);
        let confirmation = if status == RawTransactionStatus::Pending {
            None
        } else {
            self.get_confirmed_transaction(&entry.tx_hash).await?
        };

        Ok(RawTransaction {
            value: decimal_field(url, "value", &entry.value)?,
            fee: match entry.fee.as_deref() {
                Some(fee) => decimal_field(url, "fee", fee)?,
                None => Amount::ZERO,
            },
            timestamp: DateTime::<Utc>::from_timestamp(entry.timestamp, 0).ok_or_else(|| {
                NetworkError::InvalidResponse {
                    url: url.to_string(),
                    reason: format!("timestamp {} out of range", entry.timestamp),
                }
            })?,
            block_height: confirmation.as_ref().map(|c| c.block_height),
            block_hash: confirmation.map(|c| c.block_hash),
            hash: entry.tx_hash,
            sender: entry.sender,
            receiver: entry.receiver.filter(|r| !r.is_empty()),
            nonce: entry.nonce,
            status,
        })
    }
}

/// Map an API status string.
///
/// Only `fail` and `invalid` mark an operation failed; statuses such as
/// `received` or `partially-executed` are kept as [`RawTransactionStatus::Other`].
/// A missing status is handled by the caller as `Unknown`, which does fail.
fn parse_status(status: &str) -> RawTransactionStatus {
    match status {
        "success" | "executed" => RawTransactionStatus::Success,
        "pending" => RawTransactionStatus::Pending,
        "fail" => RawTransactionStatus::Fail,
        "invalid" => RawTransactionStatus::Invalid,
        "" => RawTransactionStatus::Unknown,
        _ => RawTransactionStatus::Other,
    }
}

fn decimal_field(url: &str, field: &str, value: &str) -> NetworkResult<Amount> {
    parse_decimal(value).ok_or_else(|| NetworkError::InvalidResponse {
        url: url.to_string(),
        reason: format!("{} is not a decimal amount: '{}'", field, value),
    })
}

#[async_trait]
impl ChainApiClient for ElrondApi {
    async fn get_balance(&self, address: &str) -> NetworkResult<Amount> {
        let account = self.get_account(address).await?;
        match account.balance.as_deref() {
            Some(balance) => decimal_field(&self.api_url, "balance", balance),
            None => Ok(Amount::ZERO),
        }
    }

    async fn get_sequence(&self, address: &str) -> NetworkResult<u64> {
        Ok(self.get_account(address).await?.nonce)
    }

    async fn get_block_height(&self) -> NetworkResult<u64> {
        let url = format!("{}/network/status/{}", self.gateway_url, METACHAIN_SHARD);
        let response: NetworkStatusResponse = self.client.get_json(&url).await?;
        Ok(response.data.status.erd_nonce)
    }

    async fn get_network_config(&self) -> NetworkResult<NetworkConfig> {
        let url = format!("{}/network/config", self.api_url);
        let response: NetworkConfigResponse = self.client.get_json(&url).await?;
        let config = response.data.config;
        Ok(NetworkConfig {
            chain_id: config.erd_chain_id,
            gas_price: Amount::from(config.erd_min_gas_price),
            gas_limit: config.erd_min_gas_limit,
            denomination: config.erd_denomination,
        })
    }

    async fn get_history(
        &self,
        address: &str,
        since: Option<DateTime<Utc>>,
    ) -> NetworkResult<Vec<RawTransaction>> {
        // `after` has second resolution; entries of the cursor's own second are
        // fetched again and deduplicated by the merger.
        let after = since.map_or(0, |since| since.timestamp().max(0));
        let url = format!(
            "{}/transactions?condition=should&after={}&sender={}&receiver={}",
            self.api_url, after, address, address
        );
        let entries: Vec<HistoryEntry> = self.client.get_json(&url).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        try_join_all(entries.into_iter().map(|entry| self.to_raw_transaction(&url, entry))).await
    }

    async fn submit(&self, signed: &SignedOperation) -> NetworkResult<SubmitReceipt> {
        let transaction = &signed.payload.transaction;
        let quote = transaction
            .fee_quote
            .as_ref()
            .ok_or_else(|| NetworkError::InvalidRequest("transaction is not prepared".to_string()))?;
        let gas_price = u64::try_from(quote.gas_price)
            .map_err(|_| NetworkError::InvalidRequest(format!("gas price {} exceeds u64", quote.gas_price)))?;

        let request = SendRequest {
            nonce: signed.payload.sequence,
            value: transaction.amount.to_string(),
            receiver: &transaction.recipient,
            sender: &signed.payload.sender,
            gas_price,
            gas_limit: quote.gas_limit,
            data: transaction.data.as_deref(),
            chain_id: &quote.chain_id,
            version: TRANSACTION_VERSION,
            options: TRANSACTION_OPTIONS,
            signature: &signed.signature,
        };

        let url = format!("{}/transaction/send", self.api_url);
        let response: SendResponse = self.client.post_json(&url, &request).await?;
        Ok(SubmitReceipt {
            hash: response.data.tx_hash.unwrap_or_default(),
        })
    }

    async fn get_confirmation(&self, hash: &str) -> NetworkResult<Option<Confirmation>> {
        self.get_confirmed_transaction(hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(parse_status("success"), RawTransactionStatus::Success);
        assert_eq!(parse_status("pending"), RawTransactionStatus::Pending);
        assert!(parse_status("fail").is_failure());
        assert!(parse_status("invalid").is_failure());
        assert_eq!(parse_status("received"), RawTransactionStatus::Other);
        assert!(!parse_status("received").is_failure());
        assert!(!parse_status("partially-executed").is_failure());
        assert!(parse_status("").is_failure());
    }

    #[test]
    fn test_history_entry_decoding() {
        let entries: Vec<HistoryEntry> = serde_json::from_str(
            r#"[{"txHash":"abc","sender":"erd1a","receiver":"erd1b","value":"1000",
                 "fee":"50","timestamp":1650000000,"nonce":7,"status":"success"},
                {"txHash":"def","sender":"erd1b","value":"1","timestamp":1650000001}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].nonce, 7);
        assert!(entries[1].fee.is_none());
        assert!(entries[1].status.is_none());
    }

    #[test]
    fn test_send_request_shape() {
        let request = SendRequest {
            nonce: 3,
            value: "10".to_string(),
            receiver: "erd1b",
            sender: "erd1a",
            gas_price: 1_000_000_000,
            gas_limit: 50_000,
            data: None,
            chain_id: "1",
            version: TRANSACTION_VERSION,
            options: TRANSACTION_OPTIONS,
            signature: "ff",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chainID"], "1");
        assert_eq!(json["gasPrice"], 1_000_000_000u64);
        assert!(json.get("data").is_none());
        assert_eq!(json["version"], 2);
    }

    #[test]
    fn test_gateway_url_defaults_to_api() {
        let client = NetworkClient::new(Default::default(), Default::default()).unwrap();
        let api = ElrondApi::new(
            client,
            &ElrondConfig {
                api_url: "https://api.example/".to_string(),
                gateway_url: None,
            },
        );
        assert_eq!(api.api_url, "https://api.example");
        assert_eq!(api.gateway_url, "https://api.example");
    }
}
