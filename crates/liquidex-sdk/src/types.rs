//! Documents exchanged with the wallet's address, transaction-construction
//! and signing calls.
//!
//! Field names follow the wallet's JSON conventions. Fields the swap logic
//! never reads are kept in `extra` so they survive the round trip through the
//! builder untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Sub-call requests and results ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveAddressDetails {
    pub subaccount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveAddress {
    pub address: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReceiveAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            extra: Map::new(),
        }
    }
}

/// Spendable inputs grouped by asset id.
pub type UtxoSet = BTreeMap<String, Vec<Utxo>>;

/// A transaction input in the builder's format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
    pub txhash: String,
    pub pt_idx: u32,
    pub asset_id: String,
    pub satoshi: u64,
    #[serde(default)]
    pub assetblinder: String,
    #[serde(default)]
    pub amountblinder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subaccount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevout_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_sig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Vec<String>>,
    /// Sighash flags the user's signature for this input must commit to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_sighash: Option<u32>,
    /// Set on inputs owned by the counterparty.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_signing: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An output of a built transaction, with its unblinding secrets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub asset_id: String,
    pub satoshi: u64,
    #[serde(default)]
    pub assetblinder: String,
    #[serde(default)]
    pub amountblinder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blinding_nonce: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Confidential data of an output that already exists in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedOutput {
    pub is_blinded: bool,
    pub index: u32,
    pub nonce_commitment: String,
    pub range_proof: String,
    pub assetblinder: String,
    pub amountblinder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blinding_nonce: Option<String>,
}

/// Directs the builder to pay `satoshi` of `asset_id` to `address`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addressee {
    pub address: String,
    pub asset_id: String,
    pub satoshi: u64,
    #[serde(flatten)]
    pub blinded: Option<BlindedOutput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Addressee {
    pub fn new(address: impl Into<String>, asset_id: impl Into<String>, satoshi: u64) -> Self {
        Self {
            address: address.into(),
            asset_id: asset_id.into(),
            satoshi,
            blinded: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtxoStrategy {
    /// The builder picks inputs from `utxos`.
    #[default]
    Default,
    /// The builder spends exactly `used_utxos`.
    Manual,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionDetails {
    pub subaccount: u32,
    pub addressees: Vec<Addressee>,
    pub utxo_strategy: UtxoStrategy,
    #[serde(default)]
    pub utxos: UtxoSet,
    #[serde(default)]
    pub used_utxos: Vec<Utxo>,
    /// The transaction intentionally stays unbalanced for a counterparty to
    /// complete.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_partial: bool,
    #[serde(default = "default_true")]
    pub randomize_inputs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_locktime: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubaccountType {
    #[serde(rename = "2of2")]
    TwoOfTwo,
    #[serde(rename = "2of3")]
    TwoOfThree,
    #[serde(rename = "2of2_no_recovery")]
    TwoOfTwoNoRecovery,
    #[serde(rename = "p2pkh")]
    P2pkh,
    #[serde(rename = "p2sh-p2wpkh")]
    P2shP2wpkh,
    #[serde(rename = "p2wpkh")]
    P2wpkh,
    #[serde(rename = "p2tr")]
    P2tr,
}

impl SubaccountType {
    /// Without a recovery path the backend cannot reconstruct the prevout
    /// script and blinding nonce for the counterparty, so they travel with
    /// the proposal instead.
    pub fn is_no_recovery(self) -> bool {
        matches!(self, SubaccountType::TwoOfTwoNoRecovery)
    }
}

/// Result of transaction construction, and of signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    /// Hex-encoded wire transaction.
    pub transaction: String,
    pub subaccount_type: SubaccountType,
    #[serde(default)]
    pub used_utxos: Vec<Utxo>,
    #[serde(default)]
    pub transaction_outputs: Vec<TransactionOutput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignWith {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "green-backend")]
    GreenBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignTransactionDetails {
    #[serde(flatten)]
    pub details: TransactionDetails,
    pub sign_with: Vec<SignWith>,
}

// ── Swap protocol names ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapType {
    Liquidex,
}

impl SwapType {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapType::Liquidex => "liquidex",
        }
    }
}

impl std::str::FromStr for SwapType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "liquidex" => Ok(SwapType::Liquidex),
            other => Err(crate::Error::UnknownSwapType(other.to_string())),
        }
    }
}

/// Encodings a swap call reads or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapFormat {
    /// A version 0 LiquidEx proposal.
    LiquidexV0,
    /// A transaction-construction result.
    Transaction,
}

impl SwapFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapFormat::LiquidexV0 => "liquidex_v0",
            SwapFormat::Transaction => "transaction",
        }
    }
}

impl std::str::FromStr for SwapFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "liquidex_v0" => Ok(SwapFormat::LiquidexV0),
            "transaction" => Ok(SwapFormat::Transaction),
            other => Err(crate::Error::UnknownSwapFormat(other.to_string())),
        }
    }
}
