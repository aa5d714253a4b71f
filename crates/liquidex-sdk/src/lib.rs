pub mod call;
pub mod complete_swap;
pub mod create_swap;
pub mod error;
pub mod network;
pub mod proposal;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tx_fields;
pub mod types;

// Calls and their driver
pub use call::{CallResult, CallStatus, Session, Step, SubCall, SwapCall, run_call};
pub use complete_swap::{CompleteSwapCall, CompleteSwapRequest, complete_swap_transaction};
pub use create_swap::{
    CreateSwapCall, CreateSwapRequest, MAKER_SIGHASH, SwapReceive, create_swap_transaction,
};

// Core types
pub use error::{Error, Result};
pub use network::{Network, NetworkParameters};
pub use proposal::{PROPOSAL_VERSION, ProposalEntry, SwapProposal};
pub use types::{
    Addressee, BlindedOutput, CreateTransactionDetails, ReceiveAddress, ReceiveAddressDetails,
    SignTransactionDetails, SignWith, SubaccountType, SwapFormat, SwapType, TransactionDetails,
    TransactionOutput, Utxo, UtxoSet, UtxoStrategy,
};

// Re-export LWK for app-layer use
pub use lwk_wollet;
