//! Ethereum explorer history against a mock explorer.

mod common;

use chrono::{TimeZone, Utc};
use common::{start_programmable_backend, test_client, MockBackend};
use serde_json::json;

use chain_sync_core::chain::ChainApiClient;
use chain_sync_core::config::EthereumConfig;
use chain_sync_core::families::ethereum::EthereumApi;

const ALICE: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
const BOB: &str = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";

fn txlist_entry(hash: &str, block: u64, timestamp: i64) -> serde_json::Value {
    json!({
        "hash": hash,
        "blockNumber": block.to_string(),
        "blockHash": format!("0xb{}", block),
        "timeStamp": timestamp.to_string(),
        "from": ALICE.to_lowercase(),
        "to": BOB.to_lowercase(),
        "value": "1000",
        "gasUsed": "21000",
        "gasPrice": "2",
        "nonce": "4",
        "isError": "0",
        "txreceipt_status": "1"
    })
}

async fn explorer(block_lookup: serde_json::Value) -> (MockBackend, EthereumApi) {
    let backend = start_programmable_backend(move |request| {
        if request.path.contains("action=getblocknobytime") {
            (200, block_lookup.to_string())
        } else if request.path.contains("action=txlist") {
            (
                200,
                json!({"status": "1", "message": "OK", "result": [txlist_entry("0xnew", 14_000_001, 1_650_000_100)]})
                    .to_string(),
            )
        } else {
            (404, String::new())
        }
    })
    .await;

    let api = EthereumApi::new(
        &EthereumConfig {
            rpc_url: backend.url(),
            failover_urls: Vec::new(),
            explorer_url: format!("{}/api", backend.url()),
            chain_id: 1,
            rpc_timeout_secs: 1,
            gas_price_multiplier: 1.0,
        },
        test_client(1),
    )
    .unwrap();
    (backend, api)
}

#[tokio::test]
async fn test_cursor_becomes_start_block() {
    let (backend, api) = explorer(json!({"status": "1", "message": "OK", "result": "14000000"})).await;
    let since = Utc.timestamp_opt(1_650_000_000, 0).unwrap();

    let history = api.get_history(ALICE, Some(since)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].block_height, Some(14_000_001));

    let lookups = backend.requests_to("/api?module=block");
    assert_eq!(lookups.len(), 1);
    assert!(lookups[0].path.contains("timestamp=1650000000&closest=after"));

    let listings = backend.requests_to("/api?module=account");
    assert_eq!(listings.len(), 1);
    assert!(listings[0].path.contains("&startblock=14000000&"));
}

#[tokio::test]
async fn test_full_fetch_skips_block_lookup() {
    let (backend, api) = explorer(json!({"status": "1", "message": "OK", "result": "1"})).await;

    api.get_history(ALICE, None).await.unwrap();

    assert!(backend.requests_to("/api?module=block").is_empty());
    assert!(backend.requests_to("/api?module=account")[0]
        .path
        .contains("&startblock=0&"));
}

#[tokio::test]
async fn test_garbled_block_lookup_is_invalid_response() {
    let (backend, api) = explorer(json!({"status": "1", "message": "OK", "result": "soon"})).await;
    let since = Utc.timestamp_opt(1_650_000_000, 0).unwrap();

    let err = api.get_history(ALICE, Some(since)).await.unwrap_err();
    assert!(matches!(err, chain_sync_core::NetworkError::InvalidResponse { .. }));
    assert!(backend.requests_to("/api?module=account").is_empty());
}
