//! Verification of [Linked Data proofs][ld-proofs] on signed
//! [W3C Verifiable Credentials][vc-data-model].
//!
//! A credential is checked against a single issuer key fixed by
//! configuration, using one of two signature suites:
//! - [`RsaSignature2018`][rsa-2018] (RSASSA-PKCS1-v1_5 with SHA-256); or
//! - [`Ed25519Signature2018`][ed25519-2018], which also checks the credential
//!   data model.
//!
//! The signed data is the URDNA2015 canonical form of the credential and of
//! the proof options. Documents are converted to RDF with the `json-ld` crate
//! and canonicalized by this one. Contexts and verification methods
//! are resolved through a [chain of resolvers][loader::ResolverChain]: a
//! static override table, packaged security contexts, inline JSON contexts,
//! and finally the network.
//!
//! A verified proof is not enough for a credential to be accepted: the
//! configured revocation service has the last word.
//!
//! [ld-proofs]: <https://w3c-ccg.github.io/ld-proofs/>
//! [vc-data-model]: <https://www.w3.org/TR/vc-data-model/>
//! [rsa-2018]: <https://w3c-ccg.github.io/lds-rsa2018/>
//! [ed25519-2018]: <https://w3c-ccg.github.io/lds-ed25519-2018/>
//!
//! # Basic Usage
//!
//! ```no_run
//! use vc_verify::config::VerifierConfig;
//! use vc_verify::verifier::Verifier;
//!
//! # async fn run(raw: &str) -> Result<(), vc_verify::error::Error> {
//! let config = VerifierConfig::load(None)?;
//! let verifier = Verifier::from_config(config)?;
//! let outcome = verifier.verify(raw).await;
//! if outcome.is_verified() {
//!     println!("valid credential");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod der;
pub mod error;
pub mod event;
pub mod hash;
pub mod jsonld;
pub mod jws;
pub mod key;
pub mod ldp;
pub mod loader;
pub mod one_or_many;
pub mod purpose;
pub mod rdf;
pub mod revocation;
pub mod urdna2015;
pub mod vc;
pub mod verifier;

pub use error::{Error, FailureReason};
pub use verifier::{VerificationOutcome, Verifier};

pub static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
