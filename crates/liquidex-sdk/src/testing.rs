//! Fixtures and a scripted wallet session for exercising swap calls without
//! a live wallet.

use std::str::FromStr;

use lwk_wollet::elements::confidential::{Asset, Nonce, Value as ConfValue};
use lwk_wollet::elements::secp256k1_zkp::{
    Generator, PedersenCommitment, PublicKey, RangeProof, Secp256k1, SecretKey, Tag, Tweak,
};
use lwk_wollet::elements::{
    AssetId, LockTime, OutPoint, Script, Sequence, Transaction, TxIn, TxInWitness, TxOut,
    TxOutWitness, Txid, encode,
};
use serde_json::Map;

use crate::call::{Session, SubCall};
use crate::complete_swap::CompleteSwapRequest;
use crate::create_swap::{CreateSwapRequest, SwapReceive};
use crate::error::{Error, Result};
use crate::network::NetworkParameters;
use crate::proposal::{ProposalEntry, SwapProposal};
use crate::tx_fields::encode_transaction;
use crate::types::{
    CreateTransactionDetails, ReceiveAddress, ReceiveAddressDetails, SignTransactionDetails,
    SubaccountType, TransactionDetails, TransactionOutput, Utxo, UtxoSet,
};

/// Asset the maker sends.
pub const ASSET_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
/// Asset the maker asks for.
pub const ASSET_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
/// An asset unrelated to the swap.
pub const ASSET_OTHER: &str = "cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc";
pub const POLICY_ASSET: &str = "5ac9f65c0efcc4775e0baec4ec03abdde22473cd3cf33c0419ca290e0751b225";

pub const MAKER_PREV_TXID: &str = "4d3c2b1a4d3c2b1a4d3c2b1a4d3c2b1a4d3c2b1a4d3c2b1a4d3c2b1a4d3c2b1a";
/// P2WPKH the maker receives on.
pub const MAKER_SCRIPT_PUBKEY: &str = "00142222222222222222222222222222222222222222";
pub const MAKER_PREVOUT_SCRIPT: &str = "522102aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa52ae";
pub const MAKER_BLINDING_NONCE: &str = "5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e";

fn blinder(byte: u8) -> String {
    format!("{byte:02x}").repeat(32)
}

fn nonce_commitment() -> Nonce {
    let secp = Secp256k1::new();
    let key = SecretKey::from_slice(&[0x11; 32]).expect("valid secret key");
    Nonce::Confidential(PublicKey::from_secret_key(&secp, &key))
}

pub fn maker_nonce_commitment_hex() -> String {
    hex::encode(encode::serialize(&nonce_commitment()))
}

/// A range proof over a blinded commitment to `value` of asset B.
pub fn range_proof(value: u64) -> RangeProof {
    let secp = Secp256k1::new();
    let asset_blinder = Tweak::from_slice(&[0x03; 32]).expect("valid tweak");
    let value_blinder = Tweak::from_slice(&[0x04; 32]).expect("valid tweak");
    let generator = Generator::new_blinded(&secp, Tag::from([0xbb; 32]), asset_blinder);
    let commitment = PedersenCommitment::new(&secp, value, value_blinder, generator);
    let key = SecretKey::from_slice(&[0x55; 32]).expect("valid secret key");
    RangeProof::new(
        &secp,
        1,
        commitment,
        value,
        value_blinder,
        &[],
        &[],
        key,
        0,
        52,
        generator,
    )
    .expect("valid range proof")
}

/// The maker's signed one-in/one-out transaction: spends 1000 of A and asks
/// for 500 of B.
pub fn proposal_transaction() -> Transaction {
    Transaction {
        version: 2,
        lock_time: LockTime::from_consensus(150),
        input: vec![TxIn {
            previous_output: OutPoint::new(
                Txid::from_str(MAKER_PREV_TXID).expect("valid txid"),
                1,
            ),
            is_pegin: false,
            script_sig: Script::new(),
            sequence: Sequence(0xffff_fffd),
            asset_issuance: Default::default(),
            witness: TxInWitness {
                script_witness: vec![vec![0x30, 0x44], vec![0x02, 0xaa]],
                ..Default::default()
            },
        }],
        output: vec![TxOut {
            asset: Asset::Explicit(AssetId::from_str(ASSET_B).expect("valid asset")),
            value: ConfValue::Explicit(500),
            nonce: nonce_commitment(),
            script_pubkey: Script::from(hex::decode(MAKER_SCRIPT_PUBKEY).expect("valid hex")),
            witness: TxOutWitness::default(),
        }],
    }
}

/// [`proposal_transaction`] before the maker signed it.
pub fn unsigned_transaction() -> Transaction {
    let mut tx = proposal_transaction();
    tx.input[0].witness = TxInWitness::default();
    tx
}

pub fn maker_utxo() -> Utxo {
    Utxo {
        txhash: MAKER_PREV_TXID.to_string(),
        pt_idx: 1,
        asset_id: ASSET_A.to_string(),
        satoshi: 1000,
        assetblinder: blinder(0x01),
        amountblinder: blinder(0x02),
        subaccount: Some(1),
        prevout_script: Some(MAKER_PREVOUT_SCRIPT.to_string()),
        ..Default::default()
    }
}

pub fn taker_utxo(asset_id: &str, satoshi: u64, pt_idx: u32) -> Utxo {
    Utxo {
        txhash: "7a".repeat(32),
        pt_idx,
        asset_id: asset_id.to_string(),
        satoshi,
        assetblinder: blinder(0x21),
        amountblinder: blinder(0x22),
        subaccount: Some(0),
        ..Default::default()
    }
}

pub fn create_request() -> CreateSwapRequest {
    CreateSwapRequest {
        swap_type: "liquidex".into(),
        output_type: "liquidex_v0".into(),
        send: maker_utxo(),
        receive: SwapReceive {
            asset_id: ASSET_B.into(),
            satoshi: 500,
            extra: Map::new(),
        },
    }
}

/// What the builder returns for [`create_request`] on a `2of2` subaccount.
pub fn unsigned_maker_details() -> TransactionDetails {
    TransactionDetails {
        transaction: encode_transaction(&unsigned_transaction()),
        subaccount_type: SubaccountType::TwoOfTwo,
        used_utxos: vec![maker_utxo()],
        transaction_outputs: vec![TransactionOutput {
            asset_id: ASSET_B.into(),
            satoshi: 500,
            assetblinder: blinder(0x03),
            amountblinder: blinder(0x04),
            blinding_nonce: Some(MAKER_BLINDING_NONCE.into()),
            extra: Map::new(),
        }],
        extra: Map::new(),
    }
}

/// `details` with the maker's signature applied.
pub fn signed(details: TransactionDetails) -> TransactionDetails {
    TransactionDetails {
        transaction: encode_transaction(&proposal_transaction()),
        ..details
    }
}

pub fn sample_proposal() -> SwapProposal {
    SwapProposal {
        version: 0,
        transaction: encode_transaction(&proposal_transaction()),
        inputs: vec![ProposalEntry {
            asset: ASSET_A.into(),
            asset_blinder: blinder(0x01),
            amount: 1000,
            amount_blinder: blinder(0x02),
            script: None,
            blinding_nonce: None,
        }],
        outputs: vec![ProposalEntry {
            asset: ASSET_B.into(),
            asset_blinder: blinder(0x03),
            amount: 500,
            amount_blinder: blinder(0x04),
            script: None,
            blinding_nonce: None,
        }],
    }
}

/// Taker request for [`sample_proposal`], holding 500 of B, some policy
/// asset for fees and an unrelated asset.
pub fn complete_request() -> CompleteSwapRequest {
    let mut utxos = UtxoSet::new();
    utxos.insert(ASSET_B.into(), vec![taker_utxo(ASSET_B, 500, 0)]);
    utxos.insert(POLICY_ASSET.into(), vec![taker_utxo(POLICY_ASSET, 2_000, 1)]);
    utxos.insert(ASSET_OTHER.into(), vec![taker_utxo(ASSET_OTHER, 42, 2)]);
    CompleteSwapRequest {
        swap_type: "liquidex".into(),
        input_type: "liquidex_v0".into(),
        output_type: "transaction".into(),
        subaccount: 0,
        utxos,
        proposal: sample_proposal(),
    }
}

/// A wallet session that answers every sub-call from fixtures and records
/// what it was asked.
#[derive(Debug)]
pub struct StubSession {
    pub network: NetworkParameters,
    pub address: String,
    pub subaccount_type: SubaccountType,
    pub calls: Vec<SubCall>,
    /// Name of the sub-call to fail, e.g. `"create_transaction"`.
    pub fail_on: Option<&'static str>,
}

impl StubSession {
    pub fn new(network: NetworkParameters) -> Self {
        Self {
            network,
            address: "addr1".to_string(),
            subaccount_type: SubaccountType::TwoOfTwo,
            calls: Vec::new(),
            fail_on: None,
        }
    }

    fn record(&mut self, call: SubCall) -> bool {
        let fail = self.fail_on == Some(call.name());
        self.calls.push(call);
        fail
    }

    /// Mimics the builder: one output per addressee, blinded with fixed
    /// factors unless the addressee already carries its own.
    fn build(&self, details: &CreateTransactionDetails) -> TransactionDetails {
        let transaction_outputs = details
            .addressees
            .iter()
            .enumerate()
            .map(|(i, addressee)| {
                let (assetblinder, amountblinder, blinding_nonce) = match &addressee.blinded {
                    Some(b) => (
                        b.assetblinder.clone(),
                        b.amountblinder.clone(),
                        b.blinding_nonce.clone(),
                    ),
                    None => (
                        blinder(0x03 + 2 * i as u8),
                        blinder(0x04 + 2 * i as u8),
                        Some(MAKER_BLINDING_NONCE.to_string()),
                    ),
                };
                TransactionOutput {
                    asset_id: addressee.asset_id.clone(),
                    satoshi: addressee.satoshi,
                    assetblinder,
                    amountblinder,
                    blinding_nonce,
                    extra: Map::new(),
                }
            })
            .collect();
        let mut extra = Map::new();
        extra.insert(
            "addressees".into(),
            serde_json::to_value(&details.addressees).expect("serializable addressees"),
        );
        TransactionDetails {
            transaction: encode_transaction(&unsigned_transaction()),
            subaccount_type: self.subaccount_type,
            used_utxos: details.used_utxos.clone(),
            transaction_outputs,
            extra,
        }
    }
}

impl Session for StubSession {
    fn network_parameters(&self) -> &NetworkParameters {
        &self.network
    }

    fn get_receive_address(&mut self, details: ReceiveAddressDetails) -> Result<ReceiveAddress> {
        if self.record(SubCall::GetReceiveAddress(details)) {
            return Err(Error::ReceiveAddress("stub failure".into()));
        }
        Ok(ReceiveAddress::new(self.address.clone()))
    }

    fn create_transaction(
        &mut self,
        details: CreateTransactionDetails,
    ) -> Result<TransactionDetails> {
        let built = self.build(&details);
        if self.record(SubCall::CreateTransaction(details)) {
            return Err(Error::CreateTransaction("stub failure".into()));
        }
        Ok(built)
    }

    fn sign_transaction(&mut self, details: SignTransactionDetails) -> Result<TransactionDetails> {
        let signed_details = signed(details.details.clone());
        if self.record(SubCall::SignTransaction(details)) {
            return Err(Error::SignTransaction("stub failure".into()));
        }
        Ok(signed_details)
    }
}
