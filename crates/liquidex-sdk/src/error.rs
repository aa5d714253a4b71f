use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown swap_type: {0}")]
    UnknownSwapType(String),

    #[error("unknown input_type: {0}")]
    UnknownInputType(String),

    #[error("unknown output_type: {0}")]
    UnknownOutputType(String),

    #[error("unknown swap format: {0}")]
    UnknownSwapFormat(String),

    #[error("swaps require a confidential-asset network (found {0})")]
    NotConfidentialNetwork(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("unsupported proposal version {0}")]
    UnsupportedProposalVersion(u32),

    #[error("input index {index} out of range ({len} inputs)")]
    InputIndexOutOfRange { index: usize, len: usize },

    #[error("output index {index} out of range ({len} outputs)")]
    OutputIndexOutOfRange { index: usize, len: usize },

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("unexpected number of proposal inputs (expected 1, found {0})")]
    UnexpectedProposalInputs(usize),

    #[error("unexpected number of proposal outputs (expected 1, found {0})")]
    UnexpectedProposalOutputs(usize),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("scriptPubKey {0} has no address form")]
    InvalidScriptPubkey(String),

    /// A sub-call result arrived when the call was not waiting for one.
    #[error("{call}: unexpected callback ({detail})")]
    UnexpectedCallback {
        call: &'static str,
        detail: &'static str,
    },

    #[error("receive address error: {0}")]
    ReceiveAddress(String),

    #[error("create transaction error: {0}")]
    CreateTransaction(String),

    #[error("sign transaction error: {0}")]
    SignTransaction(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors raised before or between rounds because the request,
    /// proposal or network did not fit the protocol.
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            Error::UnexpectedCallback { .. }
                | Error::ReceiveAddress(_)
                | Error::CreateTransaction(_)
                | Error::SignTransaction(_)
        )
    }
}
