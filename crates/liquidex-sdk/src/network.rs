use lwk_wollet::ElementsNetwork;
use lwk_wollet::elements::AddressParams;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Networks a wallet session can be attached to.
///
/// Only the Liquid variants carry confidential assets; swaps refuse to run on
/// the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Liquid,
    #[serde(alias = "liquid-testnet")]
    LiquidTestnet,
    #[serde(alias = "liquid-regtest", alias = "localtest-liquid")]
    LiquidRegtest,
    #[serde(alias = "mainnet")]
    Bitcoin,
    #[serde(alias = "bitcoin-testnet")]
    Testnet,
}

impl Network {
    pub fn into_lwk(self) -> Option<ElementsNetwork> {
        match self {
            Network::Liquid => Some(ElementsNetwork::Liquid),
            Network::LiquidTestnet => Some(ElementsNetwork::LiquidTestnet),
            Network::LiquidRegtest => Some(ElementsNetwork::default_regtest()),
            Network::Bitcoin | Network::Testnet => None,
        }
    }

    pub fn is_liquid(self) -> bool {
        matches!(
            self,
            Network::Liquid | Network::LiquidTestnet | Network::LiquidRegtest
        )
    }

    pub fn is_mainnet(self) -> bool {
        matches!(self, Network::Liquid | Network::Bitcoin)
    }

    pub fn address_params(self) -> Option<&'static AddressParams> {
        match self {
            Network::Liquid => Some(&AddressParams::LIQUID),
            Network::LiquidTestnet => Some(&AddressParams::LIQUID_TESTNET),
            Network::LiquidRegtest => Some(&AddressParams::ELEMENTS),
            Network::Bitcoin | Network::Testnet => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Liquid => "liquid",
            Network::LiquidTestnet => "liquidtestnet",
            Network::LiquidRegtest => "liquidregtest",
            Network::Bitcoin => "bitcoin",
            Network::Testnet => "testnet",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "liquid" => Ok(Network::Liquid),
            "liquid-testnet" | "liquidtestnet" => Ok(Network::LiquidTestnet),
            "liquid-regtest" | "liquidregtest" | "localtest-liquid" => Ok(Network::LiquidRegtest),
            "mainnet" | "bitcoin" => Ok(Network::Bitcoin),
            "testnet" | "bitcoin-testnet" => Ok(Network::Testnet),
            _ => Err(Error::UnknownNetwork(s.to_string())),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session network configuration.
///
/// ```json
/// { "network": "liquidregtest", "policy_asset": "5ac9f6..." }
/// ```
///
/// `policy_asset` overrides the network default, which custom regtest chains
/// need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_asset: Option<String>,
}

impl NetworkParameters {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            policy_asset: None,
        }
    }

    pub fn with_policy_asset(mut self, policy_asset: impl Into<String>) -> Self {
        self.policy_asset = Some(policy_asset.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_liquid(&self) -> bool {
        self.network.is_liquid()
    }

    /// Hex id of the asset fees are paid in.
    pub fn policy_asset(&self) -> Result<String> {
        if let Some(asset) = &self.policy_asset {
            return Ok(asset.clone());
        }
        self.network
            .into_lwk()
            .map(|network| network.policy_asset().to_string())
            .ok_or_else(|| Error::NotConfidentialNetwork(self.network.to_string()))
    }

    pub fn address_params(&self) -> Result<&'static AddressParams> {
        self.network
            .address_params()
            .ok_or_else(|| Error::NotConfidentialNetwork(self.network.to_string()))
    }
}
