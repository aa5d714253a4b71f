//! Maker side: turn one of our UTXOs into a LiquidEx proposal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::call::{CallResult, CallStatus, Session, Step, SubCall, SwapCall, run_call, unexpected};
use crate::error::{Error, Result};
use crate::proposal::{PROPOSAL_VERSION, SwapProposal, entries_from_tx_parts};
use crate::types::{
    Addressee, CreateTransactionDetails, ReceiveAddress, ReceiveAddressDetails, SignTransactionDetails,
    SignWith, SubaccountType, SwapFormat, SwapType, TransactionDetails, Utxo, UtxoSet, UtxoStrategy,
};

const SIGHASH_SINGLE: u32 = 0x03;
const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Sighash the maker signs with, leaving the rest of the transaction open.
pub const MAKER_SIGHASH: u32 = SIGHASH_SINGLE | SIGHASH_ANYONECANPAY;

/// What the maker asks for in return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceive {
    pub asset_id: String,
    pub satoshi: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// ```json
/// {
///   "swap_type": "liquidex",
///   "output_type": "liquidex_v0",
///   "send": { "subaccount": 1, "asset_id": "...", "satoshi": 1000, ... },
///   "receive": { "asset_id": "...", "satoshi": 500 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSwapRequest {
    pub swap_type: String,
    pub output_type: String,
    /// The UTXO the maker gives away, in full.
    pub send: Utxo,
    pub receive: SwapReceive,
}

#[derive(Debug)]
enum State {
    Start,
    AwaitingAddress,
    AwaitingTransaction { receive_address: ReceiveAddress },
    AwaitingSignature { subaccount_type: SubaccountType },
    Done,
    Failed,
}

/// `create_swap_transaction`: receive address, then the one-in/one-out
/// transaction, then the maker's signature.
#[derive(Debug)]
pub struct CreateSwapCall {
    request: CreateSwapRequest,
    subaccount: u32,
    state: State,
}

impl CreateSwapCall {
    pub fn new(request: CreateSwapRequest) -> Self {
        Self {
            subaccount: request.send.subaccount.unwrap_or_default(),
            request,
            state: State::Start,
        }
    }

    /// The receive address acquired in the first round, once known.
    pub fn receive_address(&self) -> Option<&ReceiveAddress> {
        match &self.state {
            State::AwaitingTransaction { receive_address } => Some(receive_address),
            _ => None,
        }
    }

    fn validate(&self) -> Result<u32> {
        match self.request.swap_type.parse::<SwapType>()? {
            SwapType::Liquidex => {}
        }
        if !matches!(self.request.output_type.parse::<SwapFormat>(), Ok(SwapFormat::LiquidexV0)) {
            return Err(Error::UnknownOutputType(self.request.output_type.clone()));
        }
        // TODO: allow receiving into a different subaccount than the one sending.
        self.request
            .send
            .subaccount
            .ok_or(Error::MissingField("send.subaccount"))
    }

    /// The acquired address overlaid with the receive side; receive fields
    /// win, `address` included.
    fn receive_addressee(&self, receive_address: ReceiveAddress) -> Result<Addressee> {
        let mut fields = Map::new();
        fields.insert("address".into(), Value::String(receive_address.address));
        if let Value::Object(receive) = serde_json::to_value(&self.request.receive)? {
            fields.extend(receive);
        }
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    fn create_details(&self, receive_address: ReceiveAddress) -> Result<CreateTransactionDetails> {
        let addressee = self.receive_addressee(receive_address)?;

        let send = self.request.send.clone();
        let mut utxos = UtxoSet::new();
        utxos.insert(send.asset_id.clone(), vec![send.clone()]);

        Ok(CreateTransactionDetails {
            subaccount: self.subaccount,
            addressees: vec![addressee],
            utxo_strategy: UtxoStrategy::Manual,
            utxos,
            used_utxos: vec![send],
            is_partial: true,
            randomize_inputs: true,
            transaction_version: None,
            transaction_locktime: None,
        })
    }

    fn on_address(&mut self, receive_address: ReceiveAddress) -> Result<Step<SwapProposal>> {
        log::debug!(
            "{}: receiving {} of {} on {}",
            self.name(),
            self.request.receive.satoshi,
            self.request.receive.asset_id,
            receive_address.address
        );
        let details = self.create_details(receive_address.clone())?;
        self.state = State::AwaitingTransaction { receive_address };
        Ok(Step::Call(SubCall::CreateTransaction(details)))
    }

    fn on_created(&mut self, mut created: TransactionDetails) -> Result<Step<SwapProposal>> {
        let maker_input = created
            .used_utxos
            .first_mut()
            .ok_or(Error::UnexpectedProposalInputs(0))?;
        maker_input.user_sighash = Some(MAKER_SIGHASH);

        let subaccount_type = created.subaccount_type;
        let mut sign_with = vec![SignWith::User];
        if !subaccount_type.is_no_recovery() {
            sign_with.push(SignWith::GreenBackend);
        }
        log::debug!("{}: signing maker leg with {sign_with:?}", self.name());
        self.state = State::AwaitingSignature { subaccount_type };
        Ok(Step::Call(SubCall::SignTransaction(SignTransactionDetails {
            details: created,
            sign_with,
        })))
    }

    fn on_signed(
        &mut self,
        signed: TransactionDetails,
        subaccount_type: SubaccountType,
    ) -> Result<Step<SwapProposal>> {
        if signed.used_utxos.len() != 1 {
            return Err(Error::UnexpectedProposalInputs(signed.used_utxos.len()));
        }
        if signed.transaction_outputs.len() != 1 {
            return Err(Error::UnexpectedProposalOutputs(
                signed.transaction_outputs.len(),
            ));
        }

        let mut inputs = entries_from_tx_parts(&signed.used_utxos);
        let mut outputs = entries_from_tx_parts(&signed.transaction_outputs);
        if subaccount_type.is_no_recovery() {
            inputs[0].script = Some(
                signed.used_utxos[0]
                    .prevout_script
                    .clone()
                    .ok_or(Error::MissingField("used_utxos[0].prevout_script"))?,
            );
            outputs[0].blinding_nonce = Some(
                signed.transaction_outputs[0]
                    .blinding_nonce
                    .clone()
                    .ok_or(Error::MissingField("transaction_outputs[0].blinding_nonce"))?,
            );
        }

        self.state = State::Done;
        Ok(Step::Done(SwapProposal {
            version: PROPOSAL_VERSION,
            transaction: signed.transaction,
            inputs,
            outputs,
        }))
    }
}

impl SwapCall for CreateSwapCall {
    type Output = SwapProposal;

    fn name(&self) -> &'static str {
        "create_swap_transaction"
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
        match self.validate() {
            Ok(subaccount) => {
                self.subaccount = subaccount;
                self.state = State::AwaitingAddress;
                Ok(SubCall::GetReceiveAddress(ReceiveAddressDetails { subaccount }))
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn resume(&mut self, result: CallResult) -> Result<Step<SwapProposal>> {
        let name = self.name();
        let step = match (std::mem::replace(&mut self.state, State::Failed), result) {
            (State::AwaitingAddress, CallResult::ReceiveAddress(address)) => self.on_address(address),
            (State::AwaitingTransaction { .. }, CallResult::CreatedTransaction(created)) => {
                self.on_created(created)
            }
            (State::AwaitingSignature { subaccount_type }, CallResult::SignedTransaction(signed)) => {
                self.on_signed(signed, subaccount_type)
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

/// Run the maker flow against `session`.
pub fn create_swap_transaction<S: Session + ?Sized>(
    session: &mut S,
    request: CreateSwapRequest,
) -> Result<SwapProposal> {
    run_call(&mut CreateSwapCall::new(request), session)
}
