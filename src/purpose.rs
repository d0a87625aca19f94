//! Proof purposes and controller authorization.
//!
//! The controller document is always built locally from configuration. The
//! trust anchor is the configured controller/key pair, never a controller
//! claimed by the credential.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::jsonld::SECURITY_V2_CONTEXT;
use crate::key::VerificationKey;
use crate::loader::ResolverChain;
use crate::one_or_many::OneOrMany;
use crate::vc::Proof;

pub const ASSERTION_METHOD: &str = "assertionMethod";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDocument {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    pub public_key: Vec<Value>,
    /// Key ids authorized to make assertions for this controller.
    pub assertion_method: Vec<String>,
}

impl ControllerDocument {
    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A verification method as resolved from its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: OneOrMany<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<Value>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

impl VerificationMethod {
    /// Resolve `id` and check the result describes `key`.
    pub async fn dereference(
        id: &str,
        key: &VerificationKey,
        resolver: &ResolverChain,
    ) -> Result<Self, Error> {
        let remote = resolver.resolve(id).await?;
        let method: Self = serde_json::from_value(remote.document).map_err(|e| {
            Error::Resolution(format!("{} is not a verification method: {}", id, e))
        })?;
        if method.revoked.is_some() {
            return Err(Error::AuthorizationFailed(format!(
                "verification method {} has been revoked",
                id
            )));
        }
        if method.id != key.id {
            return Err(Error::AuthorizationFailed(format!(
                "verification method {} does not match configured key {}",
                method.id, key.id
            )));
        }
        if !method.type_.contains(&key.type_.as_str().to_string()) {
            return Err(Error::AuthorizationFailed(format!(
                "verification method {} is not of type {}",
                method.id,
                key.type_.as_str()
            )));
        }
        Ok(method)
    }
}

/// Purpose of a proof made by a key authorized by `controller` to assert
/// claims.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionProofPurpose {
    pub controller: ControllerDocument,
}

impl AssertionProofPurpose {
    pub fn term(&self) -> &'static str {
        ASSERTION_METHOD
    }

    pub fn validate(&self, proof: &Proof, method: &VerificationMethod) -> Result<(), Error> {
        match proof.proof_purpose.as_deref() {
            Some(ASSERTION_METHOD) => {}
            Some(other) => {
                return Err(Error::AuthorizationFailed(format!(
                    "proof purpose {} does not match {}",
                    other, ASSERTION_METHOD
                )))
            }
            None => {
                return Err(Error::AuthorizationFailed(
                    "proof has no proofPurpose".to_string(),
                ))
            }
        }
        if method.controller.as_deref() != Some(self.controller.id.as_str()) {
            return Err(Error::AuthorizationFailed(
                "verification method controller does not match".to_string(),
            ));
        }
        if !self.controller.assertion_method.contains(&method.id) {
            return Err(Error::AuthorizationFailed(format!(
                "verification method {} not authorized by controller for proof purpose {}",
                method.id, ASSERTION_METHOD
            )));
        }
        Ok(())
    }
}

/// Controller document listing exactly `key`, authorized for assertions,
/// and the purpose checking against it.
pub fn build_authorization(
    key: &VerificationKey,
    controller_id: &str,
) -> (ControllerDocument, AssertionProofPurpose) {
    let controller = ControllerDocument {
        context: SECURITY_V2_CONTEXT.to_string(),
        id: controller_id.to_string(),
        public_key: vec![key.to_document()],
        assertion_method: vec![key.id.clone()],
    };
    let purpose = AssertionProofPurpose {
        controller: controller.clone(),
    };
    (controller, purpose)
}
