//! Verification of signed credentials against the configured issuer key.
//!
//! [`Verifier::verify`] runs a single attempt to completion: parse, select the
//! configured suite, check the proof and its purpose, then consult the
//! revocation service. Every attempt ends in one [`VerificationOutcome`] and
//! emits one [`VerificationEvent`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::VerifierConfig;
use crate::error::{Error, FailureReason};
use crate::event::{EventSink, LogEventSink, VerificationEvent};
use crate::key::{build_key, SigningAlgorithm, VerificationKey};
use crate::ldp::{self, ProofSuite};
use crate::loader::{HttpDocumentLoader, ResolverChain, StaticResolver};
use crate::purpose::{build_authorization, ControllerDocument};
use crate::revocation::{HttpRevocationCheck, RevocationCheck};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum VerificationOutcome {
    /// Signature, authorization and revocation status all hold.
    Verified { subject: Value },
    Unverified {
        reason: FailureReason,
        message: String,
    },
    /// The input or the configuration could not be used at all.
    Malformed {
        reason: FailureReason,
        message: String,
    },
}

impl VerificationOutcome {
    fn unverified(err: &Error) -> Self {
        Self::Unverified {
            reason: err.reason(),
            message: err.to_string(),
        }
    }

    fn malformed(err: &Error) -> Self {
        Self::Malformed {
            reason: err.reason(),
            message: err.to_string(),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Verified { .. } => None,
            Self::Unverified { reason, .. } | Self::Malformed { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Clone)]
pub struct Verifier {
    config: Arc<VerifierConfig>,
    revocation: Arc<dyn RevocationCheck>,
    events: Arc<dyn EventSink>,
    /// Shared by every attempt and every clone of this verifier.
    network: Option<Arc<HttpDocumentLoader>>,
    settle_delay: Duration,
}

impl Verifier {
    pub fn new<R, E>(config: VerifierConfig, revocation: R, events: E) -> Self
    where
        R: RevocationCheck + 'static,
        E: EventSink + 'static,
    {
        let network = if config.network_fallback {
            match HttpDocumentLoader::new() {
                Ok(loader) => Some(Arc::new(loader)),
                Err(err) => {
                    log::warn!("network document loader unavailable: {}", err);
                    None
                }
            }
        } else {
            None
        };
        Self {
            network,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            config: Arc::new(config),
            revocation: Arc::new(revocation),
            events: Arc::new(events),
        }
    }

    /// Verifier using the configured HTTP revocation endpoint, logging events.
    pub fn from_config(config: VerifierConfig) -> Result<Self, Error> {
        let revocation = HttpRevocationCheck::new(&config.revocation_endpoint()?)?;
        Ok(Self::new(config, revocation, LogEventSink))
    }

    /// Resolve documents only from the static table and packaged contexts.
    pub fn without_network(mut self) -> Self {
        self.network = None;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Resolver chain for one attempt: the configured key and controller
    /// documents take precedence over everything else.
    fn resolver(
        &self,
        key: &VerificationKey,
        controller: &ControllerDocument,
    ) -> Result<ResolverChain, Error> {
        let overrides = StaticResolver::with_default_contexts()
            .with(&key.id, key.to_document())
            .with(&controller.id, controller.to_value()?);
        Ok(ResolverChain::standard(overrides, self.network.clone()))
    }

    /// Verify one raw credential. Never fails: every error is folded into the
    /// returned outcome, and exactly one event is emitted.
    pub async fn verify(&self, raw: &str) -> VerificationOutcome {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        let (outcome, event) = self.run(raw).await;
        match outcome {
            VerificationOutcome::Verified { .. } => log::info!("credential verified"),
            VerificationOutcome::Unverified {
                ref reason,
                ref message,
            }
            | VerificationOutcome::Malformed {
                ref reason,
                ref message,
            } => log::info!("credential not verified ({}): {}", reason, message),
        }
        self.events.emit(event);
        outcome
    }

    async fn run(&self, raw: &str) -> (VerificationOutcome, VerificationEvent) {
        let credential = match parse_credential(raw) {
            Ok(credential) => credential,
            Err(err) => {
                let event = VerificationEvent::InvalidVerification {
                    payload: Value::String(raw.to_string()),
                };
                return (VerificationOutcome::malformed(&err), event);
            }
        };
        let invalid = |outcome| {
            let event = VerificationEvent::InvalidVerification {
                payload: credential.clone(),
            };
            (outcome, event)
        };
        let result = match self.check_proof(&credential).await {
            Ok(result) => result,
            Err(err) => return invalid(VerificationOutcome::malformed(&err)),
        };
        if !result.verified {
            let err = result.error.unwrap_or(Error::SignatureInvalid);
            return invalid(VerificationOutcome::unverified(&err));
        }
        match self.revocation.is_clean(&credential).await {
            Ok(true) => {
                let subject = credential
                    .get("credentialSubject")
                    .cloned()
                    .unwrap_or(Value::Null);
                let event = VerificationEvent::ValidVerification {
                    subject: subject.clone(),
                };
                (VerificationOutcome::Verified { subject }, event)
            }
            Ok(false) => {
                let outcome = VerificationOutcome::Unverified {
                    reason: FailureReason::Revoked,
                    message: "Credential has been revoked".to_string(),
                };
                let event = VerificationEvent::RevokedCertificate {
                    payload: credential.clone(),
                };
                (outcome, event)
            }
            Err(err) => invalid(VerificationOutcome::unverified(&err)),
        }
    }

    /// Select the configured suite and check the credential's proof.
    async fn check_proof(&self, credential: &Value) -> Result<ldp::VerificationResult, Error> {
        let algorithm: SigningAlgorithm = self.config.signed_key_type.parse()?;
        let suite = ProofSuite::for_algorithm(algorithm);
        let key = build_key(algorithm, &self.config)?;
        let (controller, purpose) = build_authorization(&key, &self.config.controller_id);
        let resolver = self.resolver(&key, &controller)?;
        log::debug!("verifying {} proof for {}", suite.type_name(), key.id);
        ldp::verify(credential, suite, &key, &purpose, &resolver).await
    }
}

fn parse_credential(raw: &str) -> Result<Value, Error> {
    let credential: Value =
        serde_json::from_str(raw.trim()).map_err(|e| Error::Parse(e.to_string()))?;
    if !credential.is_object() {
        return Err(Error::Parse("credential must be a JSON object".to_string()));
    }
    Ok(credential)
}
