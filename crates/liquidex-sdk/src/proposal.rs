//! LiquidEx proposals and their conversion to and from builder documents.
//!
//! A proposal is the maker's half of a swap transaction: one signed input
//! and one output, signed `SIGHASH_SINGLE | SIGHASH_ANYONECANPAY` so a taker
//! can append their own inputs and outputs. The unblinding secrets of both
//! legs travel alongside the transaction.

use std::collections::BTreeSet;
use std::str::FromStr;

use lwk_wollet::elements::Transaction;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::network::NetworkParameters;
use crate::tx_fields::{
    TxInputFields, address_from_script_pubkey, extract_input_fields, extract_output_fields,
};
use crate::types::{Addressee, BlindedOutput, TransactionOutput, Utxo, UtxoSet};

pub const PROPOSAL_VERSION: u32 = 0;

/// A LiquidEx v0 swap proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapProposal {
    pub version: u32,
    /// Hex-encoded wire transaction.
    pub transaction: String,
    pub inputs: Vec<ProposalEntry>,
    pub outputs: Vec<ProposalEntry>,
}

/// Unblinding secrets of one proposal leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalEntry {
    pub asset: String,
    pub asset_blinder: String,
    pub amount: u64,
    pub amount_blinder: String,
    /// Prevout script, only sent by `2of2_no_recovery` makers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Output blinding nonce, only sent by `2of2_no_recovery` makers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blinding_nonce: Option<String>,
}

impl SwapProposal {
    /// The maker's input leg.
    pub fn maker_input(&self) -> Result<&ProposalEntry> {
        self.inputs.first().ok_or(Error::UnexpectedProposalInputs(0))
    }

    /// The maker's output leg.
    pub fn maker_output(&self) -> Result<&ProposalEntry> {
        self.outputs.first().ok_or(Error::UnexpectedProposalOutputs(0))
    }
}

impl std::fmt::Display for SwapProposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromStr for SwapProposal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Builder documents that carry a blinded asset amount.
pub trait TxPart {
    fn asset_id(&self) -> &str;
    fn assetblinder(&self) -> &str;
    fn satoshi(&self) -> u64;
    fn amountblinder(&self) -> &str;
}

impl TxPart for Utxo {
    fn asset_id(&self) -> &str {
        &self.asset_id
    }
    fn assetblinder(&self) -> &str {
        &self.assetblinder
    }
    fn satoshi(&self) -> u64 {
        self.satoshi
    }
    fn amountblinder(&self) -> &str {
        &self.amountblinder
    }
}

impl TxPart for TransactionOutput {
    fn asset_id(&self) -> &str {
        &self.asset_id
    }
    fn assetblinder(&self) -> &str {
        &self.assetblinder
    }
    fn satoshi(&self) -> u64 {
        self.satoshi
    }
    fn amountblinder(&self) -> &str {
        &self.amountblinder
    }
}

impl ProposalEntry {
    pub fn from_part<P: TxPart + ?Sized>(part: &P) -> Self {
        Self {
            asset: part.asset_id().to_string(),
            asset_blinder: part.assetblinder().to_string(),
            amount: part.satoshi(),
            amount_blinder: part.amountblinder().to_string(),
            script: None,
            blinding_nonce: None,
        }
    }
}

/// Project builder inputs or outputs into proposal entries, one per part,
/// in order.
pub fn entries_from_tx_parts<P: TxPart>(parts: &[P]) -> Vec<ProposalEntry> {
    parts.iter().map(ProposalEntry::from_part).collect()
}

/// The maker's input rebuilt as a builder input for the taker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakerLegRequest {
    pub prevout: TxInputFields,
    pub asset_id: String,
    pub assetblinder: String,
    pub satoshi: u64,
    pub amountblinder: String,
}

impl MakerLegRequest {
    /// The builder input, flagged so the taker's wallet does not try to
    /// sign it.
    pub fn into_utxo(self) -> Utxo {
        Utxo {
            txhash: self.prevout.txhash,
            pt_idx: self.prevout.pt_idx,
            asset_id: self.asset_id,
            satoshi: self.satoshi,
            assetblinder: self.assetblinder,
            amountblinder: self.amountblinder,
            sequence: Some(self.prevout.sequence),
            script_sig: Some(self.prevout.script_sig),
            witness: Some(self.prevout.witness),
            skip_signing: true,
            ..Default::default()
        }
    }
}

pub fn maker_leg_from_proposal(
    tx: &Transaction,
    proposal_input: &ProposalEntry,
) -> Result<MakerLegRequest> {
    if tx.input.is_empty() {
        return Err(Error::NoInputs);
    }
    Ok(MakerLegRequest {
        prevout: extract_input_fields(tx, 0)?,
        asset_id: proposal_input.asset.clone(),
        assetblinder: proposal_input.asset_blinder.clone(),
        satoshi: proposal_input.amount,
        amountblinder: proposal_input.amount_blinder.clone(),
    })
}

/// The maker's output, kept as-is in the completed transaction.
pub fn maker_addressee_from_proposal(
    network: &NetworkParameters,
    tx: &Transaction,
    proposal_output: &ProposalEntry,
) -> Result<Addressee> {
    let output = tx.output.first().ok_or(Error::NoOutputs)?;
    let fields = extract_output_fields(tx, 0)?;
    let address = address_from_script_pubkey(network, &output.script_pubkey)?;

    let mut addressee = Addressee::new(address, proposal_output.asset.clone(), proposal_output.amount);
    addressee.blinded = Some(BlindedOutput {
        is_blinded: true,
        index: 0,
        nonce_commitment: fields.nonce_commitment,
        range_proof: fields.range_proof,
        assetblinder: proposal_output.asset_blinder.clone(),
        amountblinder: proposal_output.amount_blinder.clone(),
        blinding_nonce: proposal_output.blinding_nonce.clone(),
    });
    Ok(addressee)
}

/// Append every UTXO of each asset in `asset_ids` to `accumulator`.
///
/// Assets missing from `utxo_set` are skipped.
pub fn collect_utxos_for_assets(
    utxo_set: &UtxoSet,
    asset_ids: &BTreeSet<String>,
    accumulator: &mut Vec<Utxo>,
) {
    for asset_id in asset_ids {
        if let Some(utxos) = utxo_set.get(asset_id) {
            accumulator.extend(utxos.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::testing::{self, ASSET_A, ASSET_B, MAKER_PREV_TXID};

    fn utxo(asset_id: &str, satoshi: u64, pt_idx: u32) -> Utxo {
        Utxo {
            txhash: "cc".repeat(32),
            pt_idx,
            asset_id: asset_id.to_string(),
            satoshi,
            assetblinder: format!("{:02x}", pt_idx).repeat(32),
            amountblinder: "ee".repeat(32),
            ..Default::default()
        }
    }

    #[test]
    fn entries_rename_fields_in_order() {
        let parts = vec![utxo(ASSET_A, 1000, 1), utxo(ASSET_B, 500, 2)];
        let entries = entries_from_tx_parts(&parts);
        assert_eq!(entries.len(), 2);
        for (entry, part) in entries.iter().zip(&parts) {
            assert_eq!(entry.asset, part.asset_id);
            assert_eq!(entry.asset_blinder, part.assetblinder);
            assert_eq!(entry.amount, part.satoshi);
            assert_eq!(entry.amount_blinder, part.amountblinder);
            assert!(entry.script.is_none());
            assert!(entry.blinding_nonce.is_none());
        }
    }

    #[test]
    fn entries_from_outputs() {
        let outputs = vec![TransactionOutput {
            asset_id: ASSET_B.into(),
            satoshi: 500,
            assetblinder: "01".repeat(32),
            amountblinder: "02".repeat(32),
            blinding_nonce: Some("03".repeat(32)),
            ..Default::default()
        }];
        let entries = entries_from_tx_parts(&outputs);
        assert_eq!(entries[0].amount, 500);
        // Blinding nonces only travel for no-recovery subaccounts.
        assert!(entries[0].blinding_nonce.is_none());
    }

    #[test]
    fn optional_entry_fields_are_omitted() {
        let entry = ProposalEntry::from_part(&utxo(ASSET_A, 1, 1));
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("script").is_none());
        assert!(value.get("blinding_nonce").is_none());
    }

    #[test]
    fn proposal_json_roundtrip() {
        let proposal = testing::sample_proposal();
        let parsed: SwapProposal = proposal.to_string().parse().unwrap();
        assert_eq!(parsed, proposal);
        assert!(matches!("{".parse::<SwapProposal>(), Err(Error::Json(_))));
    }

    #[test]
    fn maker_leg_reads_prevout_and_overlays_secrets() {
        let tx = testing::proposal_transaction();
        let proposal = testing::sample_proposal();
        let leg = maker_leg_from_proposal(&tx, &proposal.inputs[0]).unwrap();
        assert_eq!(leg.prevout.txhash, MAKER_PREV_TXID);
        assert_eq!(leg.asset_id, ASSET_A);
        assert_eq!(leg.satoshi, 1000);

        let utxo = leg.into_utxo();
        assert!(utxo.skip_signing);
        assert_eq!(utxo.pt_idx, 1);
        assert_eq!(utxo.assetblinder, proposal.inputs[0].asset_blinder);
        assert_eq!(utxo.witness.as_deref().map(|w| w.len()), Some(2));
    }

    #[test]
    fn maker_leg_needs_an_input() {
        let mut tx = testing::proposal_transaction();
        tx.input.clear();
        let proposal = testing::sample_proposal();
        assert!(matches!(
            maker_leg_from_proposal(&tx, &proposal.inputs[0]),
            Err(Error::NoInputs)
        ));
    }

    #[test]
    fn maker_addressee_keeps_confidential_output() {
        let tx = testing::proposal_transaction();
        let network = NetworkParameters::new(Network::LiquidRegtest);
        let mut proposal = testing::sample_proposal();
        proposal.outputs[0].blinding_nonce = Some("44".repeat(32));

        let addressee = maker_addressee_from_proposal(&network, &tx, &proposal.outputs[0]).unwrap();
        assert_eq!(addressee.asset_id, ASSET_B);
        assert_eq!(addressee.satoshi, 500);
        let blinded = addressee.blinded.unwrap();
        assert!(blinded.is_blinded);
        assert_eq!(blinded.index, 0);
        assert_eq!(blinded.nonce_commitment, testing::maker_nonce_commitment_hex());
        assert_eq!(blinded.assetblinder, proposal.outputs[0].asset_blinder);
        assert_eq!(blinded.blinding_nonce, Some("44".repeat(32)));
    }

    #[test]
    fn maker_addressee_without_blinding_nonce() {
        let tx = testing::proposal_transaction();
        let network = NetworkParameters::new(Network::Liquid);
        let proposal = testing::sample_proposal();
        let addressee = maker_addressee_from_proposal(&network, &tx, &proposal.outputs[0]).unwrap();
        let value = serde_json::to_value(&addressee).unwrap();
        assert!(value.get("blinding_nonce").is_none());
        assert!(addressee.address.starts_with("ex1q"));
    }

    #[test]
    fn maker_addressee_needs_an_output() {
        let mut tx = testing::proposal_transaction();
        tx.output.clear();
        let network = NetworkParameters::new(Network::LiquidRegtest);
        let proposal = testing::sample_proposal();
        assert!(matches!(
            maker_addressee_from_proposal(&network, &tx, &proposal.outputs[0]),
            Err(Error::NoOutputs)
        ));
    }

    #[test]
    fn collect_only_requested_assets() {
        let other = "dd".repeat(32);
        let mut set = UtxoSet::new();
        set.insert(ASSET_B.into(), vec![utxo(ASSET_B, 300, 1), utxo(ASSET_B, 200, 2)]);
        set.insert(other.clone(), vec![utxo(&other, 7, 3)]);

        let wanted: BTreeSet<String> = [ASSET_A.to_string(), ASSET_B.to_string()].into();
        let mut acc = vec![utxo(ASSET_A, 1000, 0)];
        collect_utxos_for_assets(&set, &wanted, &mut acc);

        assert_eq!(acc.len(), 3);
        assert_eq!(acc[0].asset_id, ASSET_A);
        assert_eq!(acc[1].pt_idx, 1);
        assert_eq!(acc[2].pt_idx, 2);
        assert!(acc.iter().all(|u| u.asset_id != other));
    }

    #[test]
    fn collect_skips_missing_assets() {
        let set = UtxoSet::new();
        let wanted: BTreeSet<String> = [ASSET_A.to_string()].into();
        let mut acc = Vec::new();
        collect_utxos_for_assets(&set, &wanted, &mut acc);
        assert!(acc.is_empty());
    }
}
