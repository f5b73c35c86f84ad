mod common;

use alloy::primitives::U256;

use wave_portal_adapters::{Eip1193Adapter, WavePortalAdapter, WavePortalConfig};
use wave_portal_core::{ClientError, Notice, WaveClient, WaveRecord};

use common::{account, contract, waver};

type DemoClient = WaveClient<Eip1193Adapter, WavePortalAdapter>;

fn demo_client() -> DemoClient {
    WaveClient::new(
        Eip1193Adapter::deterministic(vec![account()]),
        WavePortalAdapter::in_memory(contract()),
    )
}

#[test]
fn connect_mount_and_wave_round_trip() {
    let client = demo_client();
    client
        .gateway
        .debug_seed(vec![WaveRecord {
            waver: waver(),
            timestamp: U256::from(1_700_000_000u64),
            message: "first".to_owned(),
        }])
        .expect("seed");
    client.mount().expect("mount");

    assert_eq!(client.check_connection().expect("check"), None);
    assert_eq!(client.connect().expect("connect"), account());
    let state = client.snapshot().expect("snapshot");
    assert_eq!(state.wave_count, Some(1));
    assert_eq!(state.waves.len(), 1);

    client.set_pending_message("hello portal").expect("set");
    let hash = client.submit_wave("hello portal").expect("submit");

    let state = client.snapshot().expect("snapshot");
    assert_eq!(state.last_tx, Some(hash));
    assert_eq!(state.wave_count, Some(2));
    assert_eq!(state.pending_message, "");
    assert!(!state.is_mining());
    // history entry + live event for our own wave
    assert_eq!(state.waves.len(), 2);
    assert_eq!(state.waves[1].message, "hello portal");
    assert_eq!(state.waves[1].address, account());

    client.load_history().expect("reload");
    assert_eq!(client.snapshot().expect("snapshot").waves.len(), 2);
}

#[test]
fn reverted_wave_alerts_and_keeps_message() {
    let client = demo_client();
    client.connect().expect("connect");
    client.gateway.debug_revert_next().expect("arm revert");
    client.set_pending_message("try again").expect("set");

    let err = client.submit_wave("try again").expect_err("reverted");
    assert!(matches!(err, ClientError::Port(_)));

    let state = client.snapshot().expect("snapshot");
    assert_eq!(state.pending_message, "try again");
    assert!(!state.is_mining());
    assert!(matches!(state.alert, Some(Notice::SubmissionFailed(_))));
    assert_eq!(state.wave_count, Some(0));
}

#[test]
fn teardown_detaches_from_gateway() {
    let client = demo_client();
    client.mount().expect("mount");
    assert_eq!(client.gateway.subscriber_count().expect("count"), 1);
    client.teardown().expect("teardown");
    assert_eq!(client.gateway.subscriber_count().expect("count"), 0);
}

#[test]
fn unconfigured_runtime_behaves_like_missing_extension() {
    let cfg = WavePortalConfig::default();
    let client = WaveClient::new(
        Eip1193Adapter::with_config(&cfg),
        WavePortalAdapter::with_config(&cfg),
    );
    assert_eq!(client.check_connection().expect("check"), None);
    assert!(matches!(client.connect(), Err(ClientError::WalletMissing)));
    assert_eq!(client.take_alert().expect("alert"), Some(Notice::WalletMissing));
    assert!(client.mount().is_err());
    assert!(!client.snapshot().expect("snapshot").listening);
}

#[test]
fn previously_authorized_account_is_picked_up_without_prompt() {
    let client = demo_client();
    client
        .wallet
        .debug_authorize(vec![account()])
        .expect("authorize");
    client.wallet.debug_deny_requests(true).expect("deny prompts");

    assert_eq!(client.check_connection().expect("check"), Some(account()));
    let state = client.snapshot().expect("snapshot");
    assert_eq!(state.account, Some(account()));
    assert_eq!(state.wave_count, Some(0));
}
