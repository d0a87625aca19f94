//! Verification keys built from configuration.
//!
//! Key material is never read from the credential under test: the key id,
//! controller and public key all come from [`VerifierConfig`].

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::VerifierConfig;
use crate::der::RsaPublicKey;
use crate::error::Error;
use crate::jsonld::SECURITY_V2_CONTEXT;
use crate::jws::Algorithm;

/// Supported signing algorithm families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    Rsa,
    Ed25519,
}

impl FromStr for SigningAlgorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RSA" => Ok(Self::Rsa),
            "ED25519" => Ok(Self::Ed25519),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa => f.write_str("RSA"),
            Self::Ed25519 => f.write_str("ED25519"),
        }
    }
}

impl SigningAlgorithm {
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa => KeyType::RsaVerificationKey2018,
            Self::Ed25519 => KeyType::Ed25519VerificationKey2018,
        }
    }

    pub fn jws_algorithm(&self) -> Algorithm {
        match self {
            Self::Rsa => Algorithm::RS256,
            Self::Ed25519 => Algorithm::EdDSA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    RsaVerificationKey2018,
    Ed25519VerificationKey2018,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RsaVerificationKey2018 => "RsaVerificationKey2018",
            Self::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ed25519([u8; 32]),
}

/// Public verification key with its identity metadata. Verification only;
/// there is no private half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    pub id: String,
    pub type_: KeyType,
    pub controller: String,
    pub public_key: PublicKey,
    /// Key as configured: PEM for RSA, base58 for Ed25519.
    pub encoded: String,
}

impl VerificationKey {
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self.public_key {
            PublicKey::Rsa(_) => SigningAlgorithm::Rsa,
            PublicKey::Ed25519(_) => SigningAlgorithm::Ed25519,
        }
    }

    /// Key description document, as served for the key id.
    pub fn to_document(&self) -> Value {
        let mut document = json!({
            "@context": SECURITY_V2_CONTEXT,
            "id": self.id,
            "type": self.type_.as_str(),
            "controller": self.controller,
        });
        let property = match self.public_key {
            PublicKey::Rsa(_) => "publicKeyPem",
            PublicKey::Ed25519(_) => "publicKeyBase58",
        };
        document[property] = Value::String(self.encoded.clone());
        document
    }
}

pub fn decode_ed25519_base58(encoded: &str) -> Result<[u8; 32], Error> {
    let bytes = bs58::decode(encoded.trim()).into_vec()?;
    Ok(<[u8; 32]>::try_from(bytes.as_slice())?)
}

/// Build the configured verification key for `algorithm`.
pub fn build_key(
    algorithm: SigningAlgorithm,
    config: &VerifierConfig,
) -> Result<VerificationKey, Error> {
    let (public_key, encoded) = match algorithm {
        SigningAlgorithm::Rsa => {
            let pem = config
                .public_key
                .as_ref()
                .ok_or(Error::MissingKey("publicKeyPem"))?;
            (PublicKey::Rsa(RsaPublicKey::from_pem(pem)?), pem.clone())
        }
        SigningAlgorithm::Ed25519 => {
            let base58 = config
                .public_key_base58
                .as_ref()
                .ok_or(Error::MissingKey("publicKeyBase58"))?;
            (
                PublicKey::Ed25519(decode_ed25519_base58(base58)?),
                base58.clone(),
            )
        }
    };
    Ok(VerificationKey {
        id: config.did.clone(),
        type_: algorithm.key_type(),
        controller: config.controller_id.clone(),
        public_key,
        encoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPKI_PEM: &str = include_str!("../tests/fixtures/rsa-public.pem");

    fn config() -> VerifierConfig {
        VerifierConfig {
            did: "did:india".to_string(),
            controller_id: "https://example.com/i/india".to_string(),
            public_key: Some(SPKI_PEM.to_string()),
            public_key_base58: Some(bs58::encode([3u8; 32]).into_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parse_algorithm() {
        assert_eq!("RSA".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Rsa);
        assert_eq!(
            "ED25519".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::Ed25519
        );
        let err = "ES256K".parse::<SigningAlgorithm>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(ref alg) if alg == "ES256K"));
    }

    #[test]
    fn build_rsa_key() {
        let key = build_key(SigningAlgorithm::Rsa, &config()).unwrap();
        assert_eq!(key.id, "did:india");
        assert_eq!(key.controller, "https://example.com/i/india");
        assert_eq!(key.type_, KeyType::RsaVerificationKey2018);
        assert!(matches!(key.public_key, PublicKey::Rsa(_)));
        let document = key.to_document();
        assert_eq!(document["type"], "RsaVerificationKey2018");
        assert_eq!(document["publicKeyPem"], SPKI_PEM);
        assert_eq!(document["@context"], SECURITY_V2_CONTEXT);
    }

    #[test]
    fn build_ed25519_key() {
        let key = build_key(SigningAlgorithm::Ed25519, &config()).unwrap();
        assert_eq!(key.public_key, PublicKey::Ed25519([3u8; 32]));
        assert_eq!(key.algorithm(), SigningAlgorithm::Ed25519);
        assert_eq!(key.to_document()["type"], "Ed25519VerificationKey2018");
    }

    #[test]
    fn missing_or_bad_key_material() {
        let mut config = config();
        config.public_key = None;
        assert!(matches!(
            build_key(SigningAlgorithm::Rsa, &config),
            Err(Error::MissingKey("publicKeyPem"))
        ));
        config.public_key_base58 = Some(bs58::encode([3u8; 16]).into_string());
        assert!(matches!(
            build_key(SigningAlgorithm::Ed25519, &config),
            Err(Error::TryFromSlice(_))
        ));
        config.public_key_base58 = Some("0OIl".to_string());
        assert!(matches!(
            build_key(SigningAlgorithm::Ed25519, &config),
            Err(Error::Base58(_))
        ));
    }
}
