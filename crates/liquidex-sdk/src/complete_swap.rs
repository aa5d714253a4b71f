//! Taker side: fund a maker's proposal and build the combined transaction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::call::{CallResult, CallStatus, Session, Step, SubCall, SwapCall, run_call, unexpected};
use crate::error::{Error, Result};
use crate::network::NetworkParameters;
use crate::proposal::{
    PROPOSAL_VERSION, SwapProposal, collect_utxos_for_assets, maker_addressee_from_proposal,
    maker_leg_from_proposal,
};
use crate::tx_fields::decode_transaction;
use crate::types::{
    Addressee, CreateTransactionDetails, ReceiveAddress, ReceiveAddressDetails, SwapFormat,
    SwapType, TransactionDetails, UtxoSet, UtxoStrategy,
};

/// ```json
/// {
///   "swap_type": "liquidex",
///   "input_type": "liquidex_v0",
///   "output_type": "transaction",
///   "subaccount": 0,
///   "utxos": { "<asset id>": [ ... ] },
///   "proposal": { "version": 0, "transaction": "...", "inputs": [...], "outputs": [...] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteSwapRequest {
    pub swap_type: String,
    pub input_type: String,
    pub output_type: String,
    pub subaccount: u32,
    /// Taker funds to draw from, by asset.
    #[serde(default)]
    pub utxos: UtxoSet,
    pub proposal: SwapProposal,
}

#[derive(Debug)]
enum State {
    Start,
    AwaitingAddress,
    AwaitingTransaction { receive_address: ReceiveAddress },
    Done,
    Failed,
}

/// `complete_swap_transaction`: receive address, then the combined
/// transaction. The result is left unsigned.
#[derive(Debug)]
pub struct CompleteSwapCall {
    network: NetworkParameters,
    request: CompleteSwapRequest,
    state: State,
}

impl CompleteSwapCall {
    pub fn new(network: NetworkParameters, request: CompleteSwapRequest) -> Self {
        Self {
            network,
            request,
            state: State::Start,
        }
    }

    pub fn receive_address(&self) -> Option<&ReceiveAddress> {
        match &self.state {
            State::AwaitingTransaction { receive_address } => Some(receive_address),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        let request = &self.request;
        match request.swap_type.parse::<SwapType>()? {
            SwapType::Liquidex => {}
        }
        if !matches!(request.input_type.parse::<SwapFormat>(), Ok(SwapFormat::LiquidexV0)) {
            return Err(Error::UnknownInputType(request.input_type.clone()));
        }
        if !matches!(request.output_type.parse::<SwapFormat>(), Ok(SwapFormat::Transaction)) {
            return Err(Error::UnknownOutputType(request.output_type.clone()));
        }
        if !self.network.is_liquid() {
            return Err(Error::NotConfidentialNetwork(self.network.network.to_string()));
        }
        if request.proposal.version != PROPOSAL_VERSION {
            return Err(Error::UnsupportedProposalVersion(request.proposal.version));
        }
        request.proposal.maker_input()?;
        request.proposal.maker_output()?;
        Ok(())
    }

    fn create_details(&self, receive_address: &ReceiveAddress) -> Result<CreateTransactionDetails> {
        let proposal = &self.request.proposal;
        let proposal_input = proposal.maker_input()?;
        let proposal_output = proposal.maker_output()?;
        let tx = decode_transaction(&proposal.transaction)?;

        // The maker's leg stays first so it keeps its SIGHASH_SINGLE pairing
        // with output 0.
        let mut used_utxos = vec![maker_leg_from_proposal(&tx, proposal_input)?.into_utxo()];
        let asset_ids: BTreeSet<String> = [
            proposal_input.asset.clone(),
            proposal_output.asset.clone(),
            self.network.policy_asset()?,
        ]
        .into();
        collect_utxos_for_assets(&self.request.utxos, &asset_ids, &mut used_utxos);

        let maker_addressee = maker_addressee_from_proposal(&self.network, &tx, proposal_output)?;
        // The taker receives what the maker gives away.
        let taker_addressee = Addressee::new(
            receive_address.address.clone(),
            proposal_input.asset.clone(),
            proposal_input.amount,
        );

        Ok(CreateTransactionDetails {
            subaccount: self.request.subaccount,
            addressees: vec![maker_addressee, taker_addressee],
            utxo_strategy: UtxoStrategy::Manual,
            utxos: UtxoSet::new(),
            used_utxos,
            is_partial: false,
            randomize_inputs: false,
            transaction_version: Some(tx.version),
            transaction_locktime: Some(tx.lock_time.to_consensus_u32()),
        })
    }

    fn on_address(&mut self, receive_address: ReceiveAddress) -> Result<Step<TransactionDetails>> {
        let details = self.create_details(&receive_address)?;
        log::debug!(
            "{}: spending {} inputs into {} outputs",
            self.name(),
            details.used_utxos.len(),
            details.addressees.len()
        );
        self.state = State::AwaitingTransaction { receive_address };
        Ok(Step::Call(SubCall::CreateTransaction(details)))
    }
}

impl SwapCall for CompleteSwapCall {
    type Output = TransactionDetails;

    fn name(&self) -> &'static str {
        "complete_swap_transaction"
    }

    fn status(&self) -> CallStatus {
        match self.state {
            State::Done => CallStatus::Done,
            State::Failed => CallStatus::Error,
            _ => CallStatus::MakeCall,
        }
    }

    fn start(&mut self) -> Result<SubCall> {
        if !matches!(self.state, State::Start) {
            return Err(unexpected(self.name(), "call already started"));
        }
        if let Err(e) = self.validate() {
            self.state = State::Failed;
            return Err(e);
        }
        self.state = State::AwaitingAddress;
        Ok(SubCall::GetReceiveAddress(ReceiveAddressDetails {
            subaccount: self.request.subaccount,
        }))
    }

    fn resume(&mut self, result: CallResult) -> Result<Step<TransactionDetails>> {
        let name = self.name();
        let step = match (std::mem::replace(&mut self.state, State::Failed), result) {
            (State::AwaitingAddress, CallResult::ReceiveAddress(address)) => self.on_address(address),
            (State::AwaitingTransaction { .. }, CallResult::CreatedTransaction(created)) => {
                // Signing the taker inputs is a separate call by the caller.
                self.state = State::Done;
                Ok(Step::Done(created))
            }
            (State::Start | State::Done | State::Failed, _) => {
                Err(unexpected(name, "no sub-call outstanding"))
            }
            _ => Err(unexpected(name, "result does not match the outstanding sub-call")),
        };
        if step.is_err() {
            self.state = State::Failed;
        }
        step
    }
}

/// Run the taker flow against `session`, on the session's network.
pub fn complete_swap_transaction<S: Session + ?Sized>(
    session: &mut S,
    request: CompleteSwapRequest,
) -> Result<TransactionDetails> {
    let network = session.network_parameters().clone();
    run_call(&mut CompleteSwapCall::new(network, request), session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::testing::{self, ASSET_A, ASSET_B, MAKER_PREV_TXID};

    fn regtest() -> NetworkParameters {
        NetworkParameters::new(Network::LiquidRegtest).with_policy_asset(testing::POLICY_ASSET)
    }

    fn build_details(request: CompleteSwapRequest) -> CreateTransactionDetails {
        let mut call = CompleteSwapCall::new(regtest(), request);
        call.start().unwrap();
        match call
            .resume(CallResult::ReceiveAddress(ReceiveAddress::new("taker_addr")))
            .unwrap()
        {
            Step::Call(SubCall::CreateTransaction(details)) => details,
            other => panic!("expected create_transaction, got {other:?}"),
        }
    }

    #[test]
    fn first_round_requests_address() {
        let mut call = CompleteSwapCall::new(regtest(), testing::complete_request());
        assert_eq!(
            call.start().unwrap(),
            SubCall::GetReceiveAddress(ReceiveAddressDetails { subaccount: 0 })
        );
    }

    #[test]
    fn rejects_wrong_input_type() {
        let mut request = testing::complete_request();
        request.input_type = "psbt".into();
        let mut call = CompleteSwapCall::new(regtest(), request);
        assert!(matches!(call.start(), Err(Error::UnknownInputType(_))));
        assert_eq!(call.status(), CallStatus::Error);
    }

    #[test]
    fn rejects_wrong_output_type() {
        let mut request = testing::complete_request();
        request.output_type = "liquidex_v0".into();
        let mut call = CompleteSwapCall::new(regtest(), request);
        assert!(matches!(call.start(), Err(Error::UnknownOutputType(_))));
    }

    #[test]
    fn rejects_unknown_swap_type() {
        let mut request = testing::complete_request();
        request.swap_type = "coinjoin".into();
        let mut call = CompleteSwapCall::new(regtest(), request);
        assert!(matches!(call.start(), Err(Error::UnknownSwapType(_))));
    }

    #[test]
    fn rejects_non_confidential_network() {
        let mut call = CompleteSwapCall::new(
            NetworkParameters::new(Network::Bitcoin),
            testing::complete_request(),
        );
        assert!(matches!(
            call.start(),
            Err(Error::NotConfidentialNetwork(_))
        ));
    }

    #[test]
    fn rejects_future_proposal_version() {
        let mut request = testing::complete_request();
        request.proposal.version = 1;
        let mut call = CompleteSwapCall::new(regtest(), request);
        assert!(matches!(
            call.start(),
            Err(Error::UnsupportedProposalVersion(1))
        ));
    }

    #[test]
    fn rejects_proposal_without_entries() {
        let mut request = testing::complete_request();
        request.proposal.outputs.clear();
        let mut call = CompleteSwapCall::new(regtest(), request);
        assert!(matches!(
            call.start(),
            Err(Error::UnexpectedProposalOutputs(0))
        ));
    }

    #[test]
    fn maker_leg_comes_first_and_is_not_signed() {
        let details = build_details(testing::complete_request());
        let maker = &details.used_utxos[0];
        assert!(maker.skip_signing);
        assert_eq!(maker.txhash, MAKER_PREV_TXID);
        assert_eq!(maker.asset_id, ASSET_A);
        assert_eq!(maker.satoshi, 1000);
        assert!(details.used_utxos[1..].iter().all(|u| !u.skip_signing));
    }

    #[test]
    fn only_swap_and_policy_assets_are_spent() {
        let details = build_details(testing::complete_request());
        let allowed = [ASSET_A, ASSET_B, testing::POLICY_ASSET];
        assert!(
            details
                .used_utxos
                .iter()
                .all(|u| allowed.contains(&u.asset_id.as_str()))
        );
        // One maker leg, the taker's B and policy-asset UTXOs; the unrelated
        // asset is left alone.
        assert_eq!(details.used_utxos.len(), 3);
    }

    #[test]
    fn policy_asset_swap_spends_each_fee_utxo_once() {
        let mut request = testing::complete_request();
        request.proposal.inputs[0].asset = testing::POLICY_ASSET.into();
        request.utxos.insert(
            testing::POLICY_ASSET.into(),
            vec![
                testing::taker_utxo(testing::POLICY_ASSET, 2_000, 1),
                testing::taker_utxo(testing::POLICY_ASSET, 3_000, 3),
            ],
        );
        let details = build_details(request);

        let maker = &details.used_utxos[0];
        assert!(maker.skip_signing);
        assert_eq!(maker.asset_id, testing::POLICY_ASSET);

        let taker = &details.used_utxos[1..];
        assert!(taker.iter().all(|u| !u.skip_signing));
        for pt_idx in [1, 3] {
            let count = taker
                .iter()
                .filter(|u| u.asset_id == testing::POLICY_ASSET && u.pt_idx == pt_idx)
                .count();
            assert_eq!(count, 1, "policy utxo {pt_idx}");
        }
        // Maker leg, the taker's B and both policy-asset UTXOs.
        assert_eq!(details.used_utxos.len(), 4);
    }

    #[test]
    fn addressees_keep_maker_output_and_pay_taker() {
        let details = build_details(testing::complete_request());
        assert_eq!(details.addressees.len(), 2);

        let maker = &details.addressees[0];
        assert_eq!(maker.asset_id, ASSET_B);
        assert_eq!(maker.satoshi, 500);
        assert!(maker.blinded.as_ref().is_some_and(|b| b.is_blinded && b.index == 0));

        let taker = &details.addressees[1];
        assert_eq!(taker, &Addressee::new("taker_addr", ASSET_A, 1000));
    }

    #[test]
    fn builder_options_preserve_proposal_layout() {
        let details = build_details(testing::complete_request());
        let tx = testing::proposal_transaction();
        assert_eq!(details.utxo_strategy, UtxoStrategy::Manual);
        assert!(details.utxos.is_empty());
        assert!(!details.randomize_inputs);
        assert!(!details.is_partial);
        assert_eq!(details.transaction_version, Some(tx.version));
        assert_eq!(
            details.transaction_locktime,
            Some(tx.lock_time.to_consensus_u32())
        );
    }

    #[test]
    fn undecodable_transaction_fails_second_round() {
        let mut request = testing::complete_request();
        request.proposal.transaction = "00".into();
        let mut call = CompleteSwapCall::new(regtest(), request);
        call.start().unwrap();
        let err = call
            .resume(CallResult::ReceiveAddress(ReceiveAddress::new("taker_addr")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransaction(_)));
        assert_eq!(call.status(), CallStatus::Error);
    }

    #[test]
    fn builder_result_is_final() {
        let mut call = CompleteSwapCall::new(regtest(), testing::complete_request());
        call.start().unwrap();
        call.resume(CallResult::ReceiveAddress(ReceiveAddress::new("taker_addr")))
            .unwrap();
        let created = testing::unsigned_maker_details();
        let step = call
            .resume(CallResult::CreatedTransaction(created.clone()))
            .unwrap();
        assert_eq!(step, Step::Done(created));
        assert_eq!(call.status(), CallStatus::Done);
        assert!(call.receive_address().is_none());
    }

    #[test]
    fn signed_result_is_unexpected() {
        let mut call = CompleteSwapCall::new(regtest(), testing::complete_request());
        call.start().unwrap();
        call.resume(CallResult::ReceiveAddress(ReceiveAddress::new("taker_addr")))
            .unwrap();
        let err = call
            .resume(CallResult::SignedTransaction(
                testing::unsigned_maker_details(),
            ))
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedCallback { .. }));
    }
}
