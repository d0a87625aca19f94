use base64::DecodeError as Base64Error;
use bs58::decode::Error as Base58Error;
use config::ConfigError;
use ring::error::KeyRejected as KeyRejectedError;
use ring::error::Unspecified as RingUnspecified;
use serde::Serialize;
use serde_json::Error as SerdeJSONError;
use std::array::TryFromSliceError;
use std::fmt;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Raw input is not a structured credential.
    #[error("Unable to parse credential: {0}")]
    Parse(String),
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Unable to resolve document: {0}")]
    Resolution(String),
    #[error("Invalid signature")]
    SignatureInvalid,
    #[error("Verification method not authorized: {0}")]
    AuthorizationFailed(String),
    #[error("Revocation check failed: {0}")]
    RevocationCheckFailed(String),
    #[error("Invalid credential: {0}")]
    CredentialStructure(String),
    #[error("No matching proofs found in the document")]
    NoMatchingProof,
    #[error("Missing proof")]
    MissingProof,
    #[error("Invalid proof: {0}")]
    InvalidProof(String),
    #[error("Missing proof signature")]
    MissingProofSignature,
    #[error("Missing verification method")]
    MissingVerificationMethod,
    #[error("Invalid JWS")]
    InvalidJWS,
    #[error("Invalid crit property in JWS header")]
    InvalidCriticalHeader,
    #[error("Unknown critical header name in JWS header")]
    UnknownCriticalHeader,
    #[error("Expected unencoded payload in JWS header")]
    ExpectedUnencodedHeader,
    #[error("Algorithm in JWS header does not match key")]
    AlgorithmMismatch,
    #[error("Missing key material: {0}")]
    MissingKey(&'static str),
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),
    #[error("JSON-LD error: {0}")]
    JsonLd(String),
    #[error("Too many remote contexts (limit {0})")]
    ContextOverflow(usize),
    #[error("Expected object")]
    ExpectedObject,
    #[error("Invalid N-Quad: {0}")]
    InvalidNQuad(String),
    #[error("Missing canonical identifier")]
    MissingIdentifier,
    #[error("Missing chosen issuer")]
    MissingChosenIssuer,
    #[error(transparent)]
    SerdeJSON(#[from] SerdeJSONError),
    #[error(transparent)]
    Base64(#[from] Base64Error),
    #[error(transparent)]
    Base58(#[from] Base58Error),
    #[error(transparent)]
    KeyRejected(#[from] KeyRejectedError),
    #[error("Cryptographic operation failed")]
    RingError(#[from] RingUnspecified),
    #[error(transparent)]
    TryFromSlice(#[from] TryFromSliceError),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of a failed verification, carried by outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    SignatureInvalid,
    AuthorizationFailed,
    Revoked,
    RevocationCheckFailed,
    ResolutionError,
    CredentialInvalid,
    ParseError,
    UnsupportedAlgorithm,
    MalformedDocument,
}

impl Error {
    pub fn reason(&self) -> FailureReason {
        match self {
            Error::SignatureInvalid | Error::NoMatchingProof | Error::RingError(_) => {
                FailureReason::SignatureInvalid
            }
            Error::AuthorizationFailed(_) => FailureReason::AuthorizationFailed,
            Error::RevocationCheckFailed(_) => FailureReason::RevocationCheckFailed,
            Error::Resolution(_) | Error::ContextOverflow(_) | Error::Reqwest(_) => {
                FailureReason::ResolutionError
            },
            Error::CredentialStructure(_) => FailureReason::CredentialInvalid,
            Error::Parse(_) | Error::SerdeJSON(_) => FailureReason::ParseError,
            Error::UnsupportedAlgorithm(_) => FailureReason::UnsupportedAlgorithm,
            _ => FailureReason::MalformedDocument,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::SignatureInvalid => "signature invalid",
            FailureReason::AuthorizationFailed => "authorization failed",
            FailureReason::Revoked => "revoked",
            FailureReason::RevocationCheckFailed => "revocation check failed",
            FailureReason::ResolutionError => "resolution error",
            FailureReason::CredentialInvalid => "credential invalid",
            FailureReason::ParseError => "parse error",
            FailureReason::UnsupportedAlgorithm => "unsupported algorithm",
            FailureReason::MalformedDocument => "malformed document",
        };
        f.write_str(name)
    }
}
