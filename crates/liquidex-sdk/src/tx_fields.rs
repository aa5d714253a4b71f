//! Field extraction from wire transactions.

use lwk_wollet::elements::confidential::Nonce;
use lwk_wollet::elements::secp256k1_zkp::RangeProof;
use lwk_wollet::elements::{Address, Script, Transaction, encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::network::NetworkParameters;

/// Prevout data of a transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInputFields {
    /// Previous txid in display (byte-reversed) order.
    pub txhash: String,
    pub pt_idx: u32,
    pub sequence: u32,
    pub script_sig: String,
    pub witness: Vec<String>,
}

/// Confidential data of a transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutputFields {
    pub range_proof: String,
    pub nonce_commitment: String,
    pub script_pubkey: String,
}

/// Decode a hex-encoded wire transaction.
pub fn decode_transaction(tx_hex: &str) -> Result<Transaction> {
    let bytes = hex::decode(tx_hex)?;
    encode::deserialize(&bytes).map_err(|e| Error::InvalidTransaction(e.to_string()))
}

pub fn encode_transaction(tx: &Transaction) -> String {
    hex::encode(encode::serialize(tx))
}

pub fn extract_input_fields(tx: &Transaction, index: usize) -> Result<TxInputFields> {
    let input = tx.input.get(index).ok_or(Error::InputIndexOutOfRange {
        index,
        len: tx.input.len(),
    })?;
    Ok(TxInputFields {
        // Txid displays byte-reversed, the way explorers and RPCs show it.
        txhash: input.previous_output.txid.to_string(),
        pt_idx: input.previous_output.vout,
        sequence: input.sequence.0,
        script_sig: hex::encode(input.script_sig.as_bytes()),
        witness: input
            .witness
            .script_witness
            .iter()
            .map(hex::encode)
            .collect(),
    })
}

pub fn extract_output_fields(tx: &Transaction, index: usize) -> Result<TxOutputFields> {
    let output = tx.output.get(index).ok_or(Error::OutputIndexOutOfRange {
        index,
        len: tx.output.len(),
    })?;
    let range_proof = output
        .witness
        .rangeproof
        .as_ref()
        .map(|proof| RangeProof::serialize(proof))
        .unwrap_or_default();
    let nonce_commitment = match output.nonce {
        Nonce::Null => Vec::new(),
        nonce => encode::serialize(&nonce),
    };
    Ok(TxOutputFields {
        range_proof: hex::encode(range_proof),
        nonce_commitment: hex::encode(nonce_commitment),
        script_pubkey: hex::encode(output.script_pubkey.as_bytes()),
    })
}

/// Unconfidential address paying to `script_pubkey` on the session network.
pub fn address_from_script_pubkey(network: &NetworkParameters, script_pubkey: &Script) -> Result<String> {
    let params = network.address_params()?;
    Address::from_script(script_pubkey, None, params)
        .map(|address| address.to_string())
        .ok_or_else(|| Error::InvalidScriptPubkey(hex::encode(script_pubkey.as_bytes())))
}
