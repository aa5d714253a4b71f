//! Resumable multi-round wallet calls.
//!
//! A swap call never talks to the wallet itself. Each round hands back the
//! one sub-call it needs ([`Step::Call`]); whoever drives the call executes it
//! and feeds the result into [`SwapCall::resume`]. Dropping the call object
//! abandons it.
//!
//! ```text
//! start() ──► SubCall ──► Session::execute ──► CallResult ──► resume()
//!                 ▲                                              │
//!                 └──────────────── Step::Call ◄─────────────────┤
//!                                                                ▼
//!                                                        Step::Done(output)
//! ```

use crate::error::{Error, Result};
use crate::network::NetworkParameters;
use crate::types::{
    CreateTransactionDetails, ReceiveAddress, ReceiveAddressDetails, SignTransactionDetails,
    TransactionDetails,
};

/// Progress of a call as seen by its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// A sub-call is outstanding (or about to be requested).
    MakeCall,
    Done,
    Error,
}

/// A dependent operation a call waits on.
#[derive(Debug, Clone, PartialEq)]
pub enum SubCall {
    GetReceiveAddress(ReceiveAddressDetails),
    CreateTransaction(CreateTransactionDetails),
    SignTransaction(SignTransactionDetails),
}

impl SubCall {
    pub fn name(&self) -> &'static str {
        match self {
            SubCall::GetReceiveAddress(_) => "get_receive_address",
            SubCall::CreateTransaction(_) => "create_transaction",
            SubCall::SignTransaction(_) => "sign_transaction",
        }
    }
}

/// Result of a [`SubCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    ReceiveAddress(ReceiveAddress),
    CreatedTransaction(TransactionDetails),
    SignedTransaction(TransactionDetails),
}

/// What a call needs next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    Call(SubCall),
    Done(T),
}

/// A multi-round wallet operation.
///
/// `start` is called once, then `resume` once per sub-call result, in order,
/// until it returns [`Step::Done`]. Any error leaves the call in
/// [`CallStatus::Error`].
pub trait SwapCall {
    type Output;

    fn name(&self) -> &'static str;

    fn status(&self) -> CallStatus;

    /// Validate the request and request the first sub-call.
    fn start(&mut self) -> Result<SubCall>;

    /// Consume the result of the outstanding sub-call.
    fn resume(&mut self, result: CallResult) -> Result<Step<Self::Output>>;
}

/// The wallet operations swap calls delegate to.
pub trait Session {
    fn network_parameters(&self) -> &NetworkParameters;

    fn get_receive_address(&mut self, details: ReceiveAddressDetails) -> Result<ReceiveAddress>;

    fn create_transaction(&mut self, details: CreateTransactionDetails)
    -> Result<TransactionDetails>;

    fn sign_transaction(&mut self, details: SignTransactionDetails) -> Result<TransactionDetails>;

    fn execute(&mut self, call: SubCall) -> Result<CallResult> {
        match call {
            SubCall::GetReceiveAddress(details) => {
                self.get_receive_address(details).map(CallResult::ReceiveAddress)
            }
            SubCall::CreateTransaction(details) => self
                .create_transaction(details)
                .map(CallResult::CreatedTransaction),
            SubCall::SignTransaction(details) => self
                .sign_transaction(details)
                .map(CallResult::SignedTransaction),
        }
    }
}

/// Drive `call` to completion against `session`.
///
/// Sub-call errors are returned as-is; rounds already completed are not
/// rolled back.
pub fn run_call<C, S>(call: &mut C, session: &mut S) -> Result<C::Output>
where
    C: SwapCall + ?Sized,
    S: Session + ?Sized,
{
    let mut next = call.start().inspect_err(|e| {
        log::warn!("{}: rejected: {e}", call.name());
    })?;
    loop {
        log::debug!("{}: waiting on {}", call.name(), next.name());
        let result = session.execute(next).inspect_err(|e| {
            log::warn!("{}: sub-call failed: {e}", call.name());
        })?;
        match call.resume(result) {
            Ok(Step::Call(sub_call)) => next = sub_call,
            Ok(Step::Done(output)) => {
                log::info!("{}: complete", call.name());
                return Ok(output);
            }
            Err(e) => {
                log::warn!("{}: failed: {e}", call.name());
                return Err(e);
            }
        }
    }
}

pub(crate) fn unexpected(call: &'static str, detail: &'static str) -> Error {
    Error::UnexpectedCallback { call, detail }
}
