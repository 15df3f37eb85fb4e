use std::collections::HashMap;

use config::{Config as ConfigLib, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::soap::wsse::DEFAULT_TTL_SECONDS;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wsse: WsseSettings,
    pub transport: TransportConfig,
    #[serde(default)]
    pub signer: Option<SignerConfig>,
}

/// Security header settings applied to every outgoing request
#[derive(Debug, Clone, Deserialize)]
pub struct WsseSettings {
    pub timestamp_ttl: u32,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub password_digest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL relative request URIs are resolved against
    pub endpoint: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Remote signing service and the actions it signs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    pub url: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("wsse.timestamp_ttl", i64::from(DEFAULT_TTL_SECONDS))?
            .set_default("wsse.password_digest", false)?
            .set_default("transport.endpoint", "http://localhost:8080/")?
            .add_source(File::with_name("config/settings").required(false));

        // Explicit overrides keep tests independent of the process environment
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // e.g. SOAP_WSSE__USERNAME, SOAP_SIGNER__ACTIONS=OpA,OpB
            builder = builder.add_source(
                Environment::with_prefix("SOAP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("signer.actions")
                    .try_parsing(true),
            );
        }

        builder.build()?.try_deserialize()
    }
}
