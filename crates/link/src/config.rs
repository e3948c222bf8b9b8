//! The configuration values the relayer consumes from its environment:
//! the chain registry, the persisted application file of an ics20
//! bootstrap, and the parameters of newly created light clients.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde_derive::{Deserialize, Serialize};

use ibc_link_types::identifier::{ChainId, ConnectionId, PortId};

use crate::link::error::LinkError;

/// Unbonding time of the chains the relayer is pointed at by default
/// (21 days, the Cosmos SDK genesis default).
pub const DEFAULT_UNBONDING_PERIOD: Duration = Duration::from_secs(1_814_400);

/// Trusting period for newly created clients. Short on purpose: the
/// relayer keeps its clients fresh far more often than this.
pub const DEFAULT_TRUSTING_PERIOD: Duration = Duration::from_secs(5_000);

/// The channel version of ics20 token transfer.
pub const ICS20_VERSION: &str = "ics20-1";

fn default_ics20_port() -> PortId {
    PortId::transfer()
}

/// Parameters of the light clients the link creates during bootstrap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    pub trusting_period: Duration,
    pub unbonding_period: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            trusting_period: DEFAULT_TRUSTING_PERIOD,
            unbonding_period: DEFAULT_UNBONDING_PERIOD,
        }
    }
}

/// One chain's entry in the registry file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub prefix: String,
    pub gas_price: String,
    pub hd_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faucet: Option<String>,
    #[serde(default = "default_ics20_port")]
    pub ics20_port: PortId,
    pub rpc: Vec<String>,
}

/// The registry: nicknames to chain descriptions. Consumed as a value;
/// producing and maintaining the file is the front-end's concern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub chains: BTreeMap<String, ChainConfig>,
}

impl Registry {
    pub fn from_yaml(contents: &str) -> Result<Self, LinkError> {
        serde_yaml::from_str(contents).map_err(LinkError::config_decode)
    }

    pub fn chain(&self, nickname: &str) -> Result<&ChainConfig, LinkError> {
        self.chains.get(nickname).ok_or_else(|| {
            LinkError::config(format!("chain `{nickname}` not found in the registry"))
        })
    }
}

/// The persisted state of an ics20 bootstrap: which two registry chains
/// it relays between, a reference to the mnemonic used for both, and the
/// connection ids once they exist. Either both connection ids are set or
/// neither is; the bootstrap fills them in and writes the file back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppConfig {
    pub src: String,
    pub dest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_connection: Option<ConnectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_connection: Option<ConnectionId>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LinkError> {
        let contents = fs::read_to_string(path).map_err(LinkError::config_io)?;
        let config: AppConfig =
            serde_yaml::from_str(&contents).map_err(LinkError::config_decode)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the file back. The YAML emitter prints scalars on a single
    /// line, so connection ids are never folded regardless of length.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), LinkError> {
        self.validate()?;
        let contents = serde_yaml::to_string(self).map_err(LinkError::config_encode)?;
        fs::write(path, contents).map_err(LinkError::config_io)
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        match (&self.src_connection, &self.dest_connection) {
            (Some(_), None) | (None, Some(_)) => Err(LinkError::config(
                "either both srcConnection and destConnection must be set, or neither".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Both connection ids, when the bootstrap has already run.
    pub fn connections(&self) -> Option<(&ConnectionId, &ConnectionId)> {
        match (&self.src_connection, &self.dest_connection) {
            (Some(src), Some(dest)) => Some((src, dest)),
            _ => None,
        }
    }

    pub fn with_connections(mut self, src: ConnectionId, dest: ConnectionId) -> Self {
        self.src_connection = Some(src);
        self.dest_connection = Some(dest);
        self
    }
}

impl FromStr for AppConfig {
    type Err = LinkError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let config: AppConfig = serde_yaml::from_str(contents).map_err(LinkError::config_decode)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
chains:
  local_gaia:
    chain_id: gaia-testing
    prefix: cosmos
    gas_price: 0.025uatom
    hd_path: m/44'/118'/0'/0/0
    rpc:
      - http://localhost:26655
  local_wasm:
    chain_id: wasmd-1
    prefix: wasm
    gas_price: 0.025ucosm
    hd_path: m/44'/1234'/0'/0/0
    faucet: http://localhost:8001
    ics20_port: custom
    rpc:
      - http://localhost:26659
"#;

    #[test]
    fn registry_parses_with_port_default() {
        let registry = Registry::from_yaml(REGISTRY).unwrap();

        let gaia = registry.chain("local_gaia").unwrap();
        assert_eq!(gaia.chain_id.as_str(), "gaia-testing");
        assert_eq!(gaia.ics20_port, PortId::transfer());
        assert!(gaia.faucet.is_none());

        let wasm = registry.chain("local_wasm").unwrap();
        assert_eq!(wasm.ics20_port.as_str(), "custom");

        assert!(registry.chain("unknown").is_err());
    }

    #[test]
    fn app_config_rejects_half_configured_connections() {
        let config: Result<AppConfig, _> = "src: local_gaia\ndest: local_wasm\nsrcConnection: connection-3\n".parse();
        assert!(config.is_err());

        let config: AppConfig =
            "src: local_gaia\ndest: local_wasm\n".parse().unwrap();
        assert!(config.connections().is_none());

        let config = config.with_connections(
            ConnectionId::new(3),
            ConnectionId::new(7),
        );
        assert!(config.validate().is_ok());
        let (src, dest) = config.connections().unwrap();
        assert_eq!(src.as_str(), "connection-3");
        assert_eq!(dest.as_str(), "connection-7");
    }

    #[test]
    fn app_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yaml");

        let config = AppConfig {
            src: "local_gaia".to_string(),
            dest: "local_wasm".to_string(),
            mnemonic: Some("enlist hip relief stomach skate base shallow".to_string()),
            src_connection: Some(ConnectionId::new(0)),
            dest_connection: Some(ConnectionId::new(0)),
        };

        config.store(&path).unwrap();

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded, config);

        // ids come out on a single line, never folded
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("srcConnection: connection-0"));
    }
}
