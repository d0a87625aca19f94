use ring::signature::{RsaPublicKeyComponents, UnparsedPublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Error;
use crate::key::PublicKey;

// RFC 7515 - JSON Web Signature (JWS)
// RFC 7797 - JSON Web Signature (JWS) Unencoded Payload Option

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    RS256,
    EdDSA,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Header {
    #[serde(rename = "alg")]
    pub algorithm: Algorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "typ")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "crit")]
    pub critical: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "b64")]
    pub base64urlencode_payload: Option<bool>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(flatten)]
    pub additional_parameters: BTreeMap<String, serde_json::Value>,
}

impl Header {
    /// Header for a detached signature over an unencoded payload.
    pub fn detached_unencoded(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            key_id: None,
            type_: None,
            critical: Some(vec!["b64".to_string()]),
            base64urlencode_payload: Some(false),
            additional_parameters: BTreeMap::new(),
        }
    }
}

pub fn base64_encode_json<T: Serialize>(object: &T) -> Result<String, Error> {
    let json = serde_json::to_string(&object)?;
    Ok(base64::encode_config(json, base64::URL_SAFE_NO_PAD))
}

pub fn verify_bytes(
    algorithm: Algorithm,
    data: &[u8],
    key: &PublicKey,
    signature: &[u8],
) -> Result<(), Error> {
    match (algorithm, key) {
        (Algorithm::RS256, PublicKey::Rsa(rsa)) => {
            let public_key = RsaPublicKeyComponents {
                n: &rsa.modulus,
                e: &rsa.public_exponent,
            };
            public_key.verify(
                &ring::signature::RSA_PKCS1_2048_8192_SHA256,
                data,
                signature,
            )?;
        }
        (Algorithm::EdDSA, PublicKey::Ed25519(bytes)) => {
            let public_key = UnparsedPublicKey::new(&ring::signature::ED25519, bytes);
            public_key.verify(data, signature)?;
        }
        _ => return Err(Error::AlgorithmMismatch),
    }
    Ok(())
}

pub fn split_jws(jws: &str) -> Result<(&str, &str, &str), Error> {
    let mut parts = jws.splitn(3, '.');
    Ok(
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(Error::InvalidJWS),
        },
    )
}

pub fn split_detached_jws(jws: &str) -> Result<(&str, &str), Error> {
    let (header_b64, omitted_payload, signature_b64) = split_jws(jws)?;
    if !omitted_payload.is_empty() {
        return Err(Error::InvalidJWS);
    }
    Ok((header_b64, signature_b64))
}

pub struct DecodedJWS {
    pub header: Header,
    pub signing_input: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Decode the header and signature of a detached JWS and build the signing
/// input over the unencoded `payload`.
/// "crit" (critical) header parameters are checked and disallowed if
/// unrecognized/unsupported.
pub fn decode_detached_parts(
    header_b64: &str,
    payload: &[u8],
    signature_b64: &str,
) -> Result<DecodedJWS, Error> {
    let signature = base64::decode_config(signature_b64, base64::URL_SAFE_NO_PAD)?;
    let header_json = base64::decode_config(header_b64, base64::URL_SAFE_NO_PAD)?;
    let header: Header = serde_json::from_slice(&header_json)?;
    for name in header.critical.iter().flatten() {
        match name.as_str() {
            "alg" | "jku" | "jwk" | "kid" | "x5u" | "x5c" | "x5t" | "x5t#S256" | "typ" | "cty"
            | "crit" => return Err(Error::InvalidCriticalHeader),
            "b64" => {}
            _ => return Err(Error::UnknownCriticalHeader),
        }
    }
    // b64 must be false and marked critical
    let b64_critical = header
        .critical
        .iter()
        .flatten()
        .any(|name| name == "b64");
    if header.base64urlencode_payload != Some(false) || !b64_critical {
        return Err(Error::ExpectedUnencodedHeader);
    }
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    Ok(DecodedJWS {
        header,
        signing_input,
        signature,
    })
}

/// Verify a JWS with detached unencoded payload. Returns the JWS header on
/// success.
pub fn detached_verify(
    jws: &str,
    payload: &[u8],
    algorithm: Algorithm,
    key: &PublicKey,
) -> Result<Header, Error> {
    let (header_b64, signature_b64) = split_detached_jws(jws)?;
    let DecodedJWS {
        header,
        signing_input,
        signature,
    } = decode_detached_parts(header_b64, payload, signature_b64)?;
    if header.algorithm != algorithm {
        return Err(Error::AlgorithmMismatch);
    }
    verify_bytes(header.algorithm, &signing_input, key, &signature)?;
    Ok(header)
}

/// Signing input and encoded header for a detached JWS, for use with an
/// external signer.
pub fn prepare_detached_unencoded_payload(
    algorithm: Algorithm,
    payload: &[u8],
) -> Result<(String, Vec<u8>), Error> {
    let header = Header::detached_unencoded(algorithm);
    let header_b64 = base64_encode_json(&header)?;
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    Ok((header_b64, signing_input))
}

pub fn complete_sign_unencoded_payload(header_b64: &str, signature: &[u8]) -> String {
    let sig_b64 = base64::encode_config(signature, base64::URL_SAFE_NO_PAD);
    [header_b64, "", &sig_b64].join(".")
}
