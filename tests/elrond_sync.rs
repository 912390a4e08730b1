//! Elrond bridge end to end against a mock API and gateway.

mod common;

use async_trait::async_trait;
use common::{start_programmable_backend, test_client, MockBackend, RecordedRequest};
use futures_util::TryStreamExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chain_sync_core::bridge::{
    AccountBridge, AddressDeriver, BroadcastError, ChainBridge, DerivationContext, SignedOperation,
    TransactionPatch,
};
use chain_sync_core::config::{ElrondConfig, ScanConfig};
use chain_sync_core::families::elrond::{ElrondApi, ElrondFamily};
use chain_sync_core::{Account, Amount, FamilyTag, OperationType, SyncError};

const ME: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";
const YOU: &str = "erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx";

#[derive(Default)]
struct ChainState {
    accounts: HashMap<String, (String, u64)>,
    transactions: Vec<Value>,
    gateway_down: bool,
}

type SharedState = Arc<Mutex<ChainState>>;

fn query(path: &str) -> HashMap<String, String> {
    url::Url::parse(&format!("http://mock{}", path))
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

fn respond(state: &SharedState, request: &RecordedRequest) -> (u16, String) {
    let state = state.lock().unwrap();
    let path = request.path.as_str();

    if request.method == "POST" && path == "/transaction/send" {
        return (200, json!({"data": {"txHash": "sent1"}, "code": "successful"}).to_string());
    }
    if let Some(address) = path.strip_prefix("/accounts/") {
        return match state.accounts.get(address) {
            Some((balance, nonce)) => (200, json!({"address": address, "balance": balance, "nonce": nonce}).to_string()),
            None => (404, json!({"message": "account not found"}).to_string()),
        };
    }
    if path.starts_with("/network/status/") {
        return (200, json!({"data": {"status": {"erd_nonce": 120}}}).to_string());
    }
    if path == "/network/config" {
        return (
            200,
            json!({"data": {"config": {
                "erd_chain_id": "D",
                "erd_denomination": 18,
                "erd_min_gas_limit": 50000,
                "erd_min_gas_price": 1000000000u64
            }}})
            .to_string(),
        );
    }
    if path.starts_with("/transactions?") {
        let params = query(path);
        let address = params.get("sender").cloned().unwrap_or_default();
        let after: i64 = params.get("after").and_then(|a| a.parse().ok()).unwrap_or(0);
        let matching: Vec<&Value> = state
            .transactions
            .iter()
            .filter(|tx| tx["sender"] == address.as_str() || tx["receiver"] == address.as_str())
            .filter(|tx| tx["timestamp"].as_i64().unwrap_or(0) >= after)
            .collect();
        return (200, Value::from(matching.into_iter().cloned().collect::<Vec<_>>()).to_string());
    }
    if let Some(hash) = path.strip_prefix("/transaction/") {
        if state.gateway_down {
            return (503, String::new());
        }
        return (
            200,
            json!({"data": {"transaction": {"hyperblockNonce": 100, "blockHash": format!("bh-{}", hash)}}}).to_string(),
        );
    }
    (404, json!({"message": "no route"}).to_string())
}

async fn setup() -> (SharedState, MockBackend, ChainBridge<ElrondFamily>) {
    let state: SharedState = Arc::new(Mutex::new(ChainState::default()));
    let handler_state = state.clone();
    let backend = start_programmable_backend(move |request| respond(&handler_state, request)).await;

    let api = ElrondApi::new(
        test_client(2),
        &ElrondConfig {
            api_url: backend.url(),
            gateway_url: None,
        },
    );
    let bridge = ChainBridge::new(ElrondFamily, Arc::new(api), ScanConfig::default());
    (state, backend, bridge)
}

fn transfer(hash: &str, sender: &str, receiver: &str, value: &str, timestamp: i64, nonce: u64) -> Value {
    json!({
        "txHash": hash,
        "sender": sender,
        "receiver": receiver,
        "value": value,
        "fee": "50000000000000",
        "timestamp": timestamp,
        "nonce": nonce,
        "status": "success"
    })
}

struct ScanDeriver;

#[async_trait]
impl AddressDeriver for ScanDeriver {
    async fn derive_address(&self, _family: FamilyTag, index: u32) -> Result<String, String> {
        Ok(format!("erd1scan{}", index))
    }
}

async fn synced_me(bridge: &ChainBridge<ElrondFamily>) -> Account {
    struct Fixed;

    #[async_trait]
    impl AddressDeriver for Fixed {
        async fn derive_address(&self, _family: FamilyTag, _index: u32) -> Result<String, String> {
            Ok(ME.to_string())
        }
    }

    let mut accounts: Vec<Account> = bridge
        .scan_accounts(DerivationContext::new(Arc::new(Fixed)))
        .try_collect()
        .await
        .unwrap();
    accounts.remove(0)
}

#[tokio::test]
async fn test_scan_halts_at_first_empty_address() {
    let (state, backend, bridge) = setup().await;
    {
        let mut state = state.lock().unwrap();
        for i in 0..3 {
            state.accounts.insert(format!("erd1scan{}", i), ("1000".to_string(), 1));
        }
    }

    let accounts: Vec<Account> = bridge
        .scan_accounts(DerivationContext::new(Arc::new(ScanDeriver)))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(accounts.len(), 4);
    assert!(accounts[..3].iter().all(|a| a.balance == Amount::from(1000u64)));
    assert!(accounts[3].is_empty());
    assert_eq!(accounts[3].id, "js:2:elrond:erd1scan3:");
    assert!(backend.requests_to("/accounts/erd1scan4").is_empty());
}

#[tokio::test]
async fn test_sync_fetches_incrementally() {
    let (state, backend, bridge) = setup().await;
    {
        let mut state = state.lock().unwrap();
        state.accounts.insert(ME.to_string(), ("5000000000000000000".to_string(), 1));
        state.transactions.push(transfer("in1", YOU, ME, "5000000000000000000", 1_650_000_000, 3));
    }

    let account = synced_me(&bridge).await;
    assert_eq!(account.operations_count, 1);
    assert_eq!(account.block_height, 120);
    let op = &account.operations[0];
    assert_eq!(op.op_type, OperationType::In);
    assert_eq!(op.block_height, Some(100));
    assert_eq!(op.block_hash.as_deref(), Some("bh-in1"));
    assert_eq!(op.transaction_sequence_number, None);

    {
        let mut state = state.lock().unwrap();
        state.accounts.insert(ME.to_string(), ("3999950000000000000".to_string(), 2));
        state.transactions.push(transfer("out1", ME, YOU, "1000000000000000000", 1_650_000_500, 1));
    }
    let synced = bridge.sync(&account).await.unwrap();

    let history_calls = backend.requests_to("/transactions?");
    let last = history_calls.last().unwrap();
    assert_eq!(query(&last.path).get("after").map(String::as_str), Some("1650000000"));

    assert_eq!(synced.operations_count, 2);
    assert_eq!(synced.operations[0].hash, "out1");
    assert_eq!(synced.operations[0].op_type, OperationType::Out);
    assert_eq!(synced.operations[0].transaction_sequence_number, Some(1));
    assert_eq!(
        synced.operations[0].value,
        Amount::from(1_000_050_000_000_000_000u64)
    );
    assert_eq!(synced.remote_sequence(), 2);
    // The prior snapshot is never touched.
    assert_eq!(account.operations_count, 1);
}

#[tokio::test]
async fn test_unknown_address_syncs_empty() {
    let (_state, _backend, bridge) = setup().await;
    let account = synced_me(&bridge).await;
    assert!(account.is_empty());
    assert_eq!(account.remote_sequence(), 0);
    assert!(account.operations.is_empty());
}

#[tokio::test]
async fn test_failed_sync_discards_partial_progress() {
    let (state, _backend, bridge) = setup().await;
    state
        .lock()
        .unwrap()
        .accounts
        .insert(ME.to_string(), ("10".to_string(), 0));
    let account = synced_me(&bridge).await;

    {
        let mut state = state.lock().unwrap();
        state.accounts.insert(ME.to_string(), ("20".to_string(), 0));
        state.transactions.push(transfer("in2", YOU, ME, "10", 1_650_000_900, 0));
        state.gateway_down = true;
    }

    let err = bridge.sync(&account).await.unwrap_err();
    assert!(matches!(err, SyncError::Network { call: "get_history", .. }));
    assert!(err.is_transient());
    assert_eq!(account.balance, Amount::from(10u64));
}

#[tokio::test]
async fn test_broadcast_submits_bound_payload_once() {
    let (state, backend, bridge) = setup().await;
    state
        .lock()
        .unwrap()
        .accounts
        .insert(ME.to_string(), ("1000000000000000000".to_string(), 9));
    let account = synced_me(&bridge).await;

    let draft = bridge.update_transaction(
        &bridge.create_transaction(),
        TransactionPatch {
            recipient: Some(YOU.to_string()),
            amount: Some(Amount::from(1_000u64)),
            ..Default::default()
        },
    );
    let prepared = bridge.prepare_transaction(&account, &draft).await.unwrap();
    assert_eq!(prepared.fees, Some(Amount::from(50_000u64 * 1_000_000_000)));

    let (payload, operation) = bridge.build_unsigned(&account, &prepared).unwrap();
    let signed = SignedOperation::bind(operation, payload, "c0ffee".to_string());

    let mut tampered = signed.clone();
    tampered.operation.recipients = vec![ME.to_string()];
    assert!(matches!(
        bridge.broadcast(&tampered).await,
        Err(BroadcastError::SignatureMismatch)
    ));
    assert!(backend.requests_to("/transaction/send").is_empty());

    let op = bridge.broadcast(&signed).await.unwrap();
    assert_eq!(op.hash, "sent1");
    assert_eq!(op.id, format!("{}-sent1-OUT", account.id));
    assert_eq!(op.block_height, Some(100));

    let sends = backend.requests_to("/transaction/send");
    assert_eq!(sends.len(), 1);
    let body: Value = serde_json::from_str(&sends[0].body).unwrap();
    assert_eq!(body["nonce"], 9);
    assert_eq!(body["value"], "1000");
    assert_eq!(body["receiver"], YOU);
    assert_eq!(body["gasLimit"], 50000);
    assert_eq!(body["chainID"], "D");
    assert_eq!(body["signature"], "c0ffee");
}
