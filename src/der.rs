//! PEM and DER decoding of RSA public keys.
//!
//! Two encodings are accepted: an X.509 `SubjectPublicKeyInfo`
//! (`-----BEGIN PUBLIC KEY-----`) and a bare PKCS#1 `RSAPublicKey`
//! (`-----BEGIN RSA PUBLIC KEY-----`).

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;

use crate::error::Error;

pub const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";
pub const PEM_RSA_PUBLIC_KEY: &str = "RSA PUBLIC KEY";

/// RSA public key as big-endian unsigned integers with no leading zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
}

impl From<&rsa::RsaPublicKey> for RsaPublicKey {
    fn from(key: &rsa::RsaPublicKey) -> Self {
        Self {
            modulus: key.n().to_bytes_be(),
            public_exponent: key.e().to_bytes_be(),
        }
    }
}

fn invalid_key(err: impl std::fmt::Display) -> Error {
    Error::InvalidKey(err.to_string())
}

/// Label of the first PEM block in `pem`.
fn pem_label(pem: &str) -> Option<&str> {
    let start = pem.find("-----BEGIN ")? + "-----BEGIN ".len();
    let end = pem[start..].find("-----")?;
    Some(&pem[start..start + end])
}

impl RsaPublicKey {
    /// Decode a DER `RSAPublicKey`.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self, Error> {
        let key = rsa::RsaPublicKey::from_pkcs1_der(der).map_err(invalid_key)?;
        Ok(Self::from(&key))
    }

    /// Decode a DER `SubjectPublicKeyInfo` carrying an RSA key.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, Error> {
        let key = rsa::RsaPublicKey::from_public_key_der(der).map_err(invalid_key)?;
        Ok(Self::from(&key))
    }

    /// Decode either PEM encoding, as selected by the block label. Escaped
    /// newlines (`\n` as two characters, common in environment variables)
    /// are accepted.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem
            .replace("\\n", "\n")
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let key = match pem_label(&pem) {
            Some(PEM_PUBLIC_KEY) => {
                rsa::RsaPublicKey::from_public_key_pem(&pem).map_err(invalid_key)?
            }
            Some(PEM_RSA_PUBLIC_KEY) => {
                rsa::RsaPublicKey::from_pkcs1_pem(&pem).map_err(invalid_key)?
            }
            Some(label) => {
                return Err(Error::InvalidKey(format!("unexpected PEM label {}", label)))
            }
            None => return Err(Error::InvalidKey("missing PEM header".to_string())),
        };
        Ok(Self::from(&key))
    }
}
