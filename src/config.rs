//! Verifier configuration, loaded once at startup.
//!
//! Values come from an optional config file overlaid by `CERTIFICATE_*`
//! environment variables, e.g. `CERTIFICATE_SIGNED_KEY_TYPE=RSA`.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::Error;
use crate::jsonld::{is_iri, resolve_reference};

pub const DEFAULT_CONFIG_FILE: &str = "vc-verify";
pub const DEFAULT_REVOCATION_PATH: &str = "/divoc/api/v1/certificate/revoked";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
pub const ENV_PREFIX: &str = "CERTIFICATE";

fn default_signed_key_type() -> String {
    "RSA".to_string()
}

fn default_revocation_url() -> String {
    DEFAULT_REVOCATION_PATH.to_string()
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_network_fallback() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifierConfig {
    /// `RSA` or `ED25519`. Kept as text so that an unsupported value fails
    /// each verification rather than startup.
    #[serde(default = "default_signed_key_type")]
    pub signed_key_type: String,
    /// Identifier of the issuer's verification key.
    pub did: String,
    /// Identifier of the controller owning the key.
    pub controller_id: String,
    /// RSA public key, SPKI or PKCS#1 PEM.
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub public_key_base58: Option<String>,
    /// Base URL the revocation path is resolved against.
    #[serde(default)]
    pub portal_url: Option<String>,
    #[serde(default = "default_revocation_url")]
    pub revocation_url: String,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Allow resolving unknown documents over the network.
    #[serde(default = "default_network_fallback")]
    pub network_fallback: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            signed_key_type: default_signed_key_type(),
            did: String::new(),
            controller_id: String::new(),
            public_key: None,
            public_key_base58: None,
            portal_url: None,
            revocation_url: default_revocation_url(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            network_fallback: true,
        }
    }
}

impl VerifierConfig {
    /// Load from `path` (or `vc-verify.{toml,json,yaml}` in the working
    /// directory) and the environment. The file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, Error> {
        let config = Config::builder()
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_FILE)).required(path.is_some()))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn from_toml(source: &str) -> Result<Self, Error> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Absolute URL of the revocation endpoint.
    pub fn revocation_endpoint(&self) -> Result<String, Error> {
        let url = resolve_reference(&self.revocation_url, self.portal_url.as_deref());
        if !is_iri(&url) || !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "revocation URL {} is not an absolute HTTP(S) URL; set portal_url",
                url
            ))
            .into());
        }
        Ok(url)
    }
}
