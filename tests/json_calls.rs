//! The JSON call surface, driven against a scripted wallet session.

use liquidex_lib::liquidex_sdk::testing::{self, StubSession, ASSET_A, ASSET_B, POLICY_ASSET};
use liquidex_lib::liquidex_sdk::{Network, NetworkParameters, SubCall, SwapProposal};
use liquidex_lib::SwapSession;
use serde_json::{json, Value};

fn regtest_session() -> SwapSession<StubSession> {
    SwapSession::new(StubSession::new(
        NetworkParameters::new(Network::LiquidRegtest).with_policy_asset(POLICY_ASSET),
    ))
}

fn create_input() -> Value {
    serde_json::to_value(testing::create_request()).unwrap()
}

#[test]
fn create_returns_proposal_document() {
    let session = regtest_session();
    let output = session.call("create_swap_transaction", create_input()).unwrap();

    assert_eq!(output["version"], 0);
    assert_eq!(output["inputs"][0]["asset"], ASSET_A);
    assert_eq!(output["inputs"][0]["amount"], 1000);
    assert_eq!(output["outputs"][0]["asset"], ASSET_B);
    assert_eq!(output["outputs"][0]["amount"], 500);
    assert!(output["inputs"][0].get("script").is_none());

    let proposal: SwapProposal = serde_json::from_value(output).unwrap();
    assert_eq!(proposal, testing::sample_proposal());
}

#[test]
fn complete_over_text() {
    let session = regtest_session();
    let input = serde_json::to_string(&testing::complete_request()).unwrap();
    let output = session.call_str("complete_swap_transaction", &input).unwrap();

    let output: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(output["used_utxos"].as_array().unwrap().len(), 3);
    assert_eq!(output["used_utxos"][0]["skip_signing"], true);
    assert_eq!(output["transaction_outputs"][1]["asset_id"], ASSET_A);

    let stub = session.into_inner().unwrap();
    assert_eq!(stub.calls.len(), 2);
    assert!(matches!(stub.calls[1], SubCall::CreateTransaction(_)));
}

#[test]
fn unknown_method_is_reported() {
    let session = regtest_session();
    let err = session.call("get_balance", json!({})).unwrap_err();
    assert_eq!(err.error, "id_method_not_found");
    assert!(err.message.contains("get_balance"));
}

#[test]
fn malformed_request_is_an_invalid_argument() {
    let session = regtest_session();
    let err = session
        .call("create_swap_transaction", json!({ "swap_type": "liquidex" }))
        .unwrap_err();
    assert_eq!(err.error, "id_invalid_argument");
    assert!(session.into_inner().unwrap().calls.is_empty());
}

#[test]
fn rejected_swap_type_is_an_invalid_argument() {
    let session = regtest_session();
    let mut input = create_input();
    input["swap_type"] = json!("submarine");
    let err = session.call("create_swap_transaction", input).unwrap_err();
    assert_eq!(err.error, "id_invalid_argument");
    assert!(err.message.contains("submarine"));
}

#[test]
fn collaborator_failure_is_unknown() {
    let mut stub = StubSession::new(NetworkParameters::new(Network::LiquidRegtest));
    stub.fail_on = Some("sign_transaction");
    let session = SwapSession::new(stub);
    let err = session.call("create_swap_transaction", create_input()).unwrap_err();
    assert_eq!(err.error, "id_unknown");
}

#[test]
fn taker_on_bitcoin_is_refused() {
    let session = SwapSession::new(StubSession::new(NetworkParameters::new(Network::Bitcoin)));
    let input = serde_json::to_value(testing::complete_request()).unwrap();
    let err = session.call("complete_swap_transaction", input).unwrap_err();
    assert_eq!(err.error, "id_invalid_argument");
    assert_eq!(
        session.network_parameters().unwrap().network,
        Network::Bitcoin
    );
}

#[test]
fn invalid_json_text_is_rejected() {
    let session = regtest_session();
    let err = session.call_str("create_swap_transaction", "{").unwrap_err();
    assert_eq!(err.error, "id_unknown");
}
