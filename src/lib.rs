pub mod commands;
pub mod error;

use std::sync::Mutex;

use liquidex_sdk::{NetworkParameters, Session};
use serde_json::Value;

pub use commands::Method;
pub use error::{Error, JsonError};
pub use liquidex_sdk;

// ============================================================================
// Swap session
// ============================================================================

/// JSON entry point for swap calls, wrapping a wallet [`Session`].
///
/// Calls are serialized: a second call waits until the first one has
/// finished all of its rounds.
pub struct SwapSession<S> {
    session: Mutex<S>,
}

impl<S: Session> SwapSession<S> {
    pub fn new(session: S) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    pub fn network_parameters(&self) -> Result<NetworkParameters, JsonError> {
        let session = self.session.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(session.network_parameters().clone())
    }

    /// Run `method` with a JSON `input` document.
    pub fn call(&self, method: &str, input: Value) -> Result<Value, JsonError> {
        log::debug!("swap_session: call {method}");
        let method: Method = method.parse()?;
        let mut session = self.session.lock().map_err(|_| Error::LockPoisoned)?;
        commands::dispatch(&mut *session, method, input).map_err(|e| {
            log::warn!("swap_session: {} failed: {e}", method.as_str());
            JsonError::from(e)
        })
    }

    /// [`SwapSession::call`] over JSON text.
    pub fn call_str(&self, method: &str, input: &str) -> Result<String, JsonError> {
        let input: Value = serde_json::from_str(input).map_err(Error::from)?;
        let output = self.call(method, input)?;
        Ok(serde_json::to_string(&output).map_err(Error::from)?)
    }

    pub fn into_inner(self) -> Result<S, JsonError> {
        Ok(self.session.into_inner().map_err(|_| Error::LockPoisoned)?)
    }
}
