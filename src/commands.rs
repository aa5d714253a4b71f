use std::str::FromStr;

use liquidex_sdk::{CompleteSwapRequest, CreateSwapRequest, Session};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Methods answered by [`crate::SwapSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    CreateSwapTransaction,
    CompleteSwapTransaction,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::CreateSwapTransaction => "create_swap_transaction",
            Method::CompleteSwapTransaction => "complete_swap_transaction",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create_swap_transaction" => Ok(Method::CreateSwapTransaction),
            "complete_swap_transaction" => Ok(Method::CompleteSwapTransaction),
            _ => Err(Error::MethodNotFound(s.to_string())),
        }
    }
}

fn parse_input<T: DeserializeOwned>(method: Method, input: Value) -> Result<T> {
    serde_json::from_value(input).map_err(|source| Error::InvalidInput {
        method: method.as_str(),
        source,
    })
}

pub fn create_swap_transaction<S: Session + ?Sized>(session: &mut S, input: Value) -> Result<Value> {
    let request: CreateSwapRequest = parse_input(Method::CreateSwapTransaction, input)?;
    let proposal = liquidex_sdk::create_swap_transaction(session, request)?;
    Ok(serde_json::to_value(proposal)?)
}

pub fn complete_swap_transaction<S: Session + ?Sized>(
    session: &mut S,
    input: Value,
) -> Result<Value> {
    let request: CompleteSwapRequest = parse_input(Method::CompleteSwapTransaction, input)?;
    let details = liquidex_sdk::complete_swap_transaction(session, request)?;
    Ok(serde_json::to_value(details)?)
}

pub fn dispatch<S: Session + ?Sized>(session: &mut S, method: Method, input: Value) -> Result<Value> {
    match method {
        Method::CreateSwapTransaction => create_swap_transaction(session, input),
        Method::CompleteSwapTransaction => complete_swap_transaction(session, input),
    }
}
