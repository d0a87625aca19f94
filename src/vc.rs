use std::collections::HashMap as Map;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::jsonld::{as_array, is_iri, CREDENTIALS_V1_CONTEXT, SECURITY_V2_CONTEXT};
use crate::one_or_many::OneOrMany;

// ********************************************
// * Data Structures for Verifiable Credentials
// * https://www.w3.org/TR/vc-data-model/
// ********************************************

pub const DEFAULT_CONTEXT: &str = CREDENTIALS_V1_CONTEXT;
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Loosely typed credential. Required properties are optional here so that
/// [`Credential::validate`] can report which one is missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<OneOrMany<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Status>,
    // This field is populated only when using
    // embedded proofs such as LD-PROOF
    //   https://w3c-ccg.github.io/ld-proofs/
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Issuer {
    URI(String),
    Object(ObjectWithId),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectWithId {
    pub id: String,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

/// Linked data proof, as embedded in a credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,
    /// Pre-2019 name of `verificationMethod`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
    #[serde(flatten)]
    pub property_set: Map<String, Value>,
}

impl Proof {
    pub fn new(type_: &str) -> Self {
        Self {
            context: None,
            type_: type_.to_string(),
            proof_purpose: None,
            verification_method: None,
            creator: None,
            created: None,
            jws: None,
            signature_value: None,
            proof_value: None,
            property_set: Map::new(),
        }
    }

    pub fn verification_method(&self) -> Option<&str> {
        self.verification_method
            .as_deref()
            .or_else(|| self.creator.as_deref())
    }

    /// Proof options document: the proof without its signature, under the
    /// context of the document it is attached to.
    pub fn to_options(&self, document_context: Option<&Value>) -> Result<Value, Error> {
        let options = Proof {
            context: Some(
                document_context
                    .cloned()
                    .unwrap_or_else(|| Value::String(SECURITY_V2_CONTEXT.to_string())),
            ),
            jws: None,
            signature_value: None,
            proof_value: None,
            ..self.clone()
        };
        Ok(serde_json::to_value(options)?)
    }
}

fn parse_date_time(name: &str, value: &str) -> Result<DateTime<FixedOffset>, Error> {
    DateTime::parse_from_rfc3339(value).map_err(|e| {
        Error::CredentialStructure(format!("\"{}\" must be a valid date: {}", name, e))
    })
}

fn check_uri(name: &str, value: &str) -> Result<(), Error> {
    if !is_iri(value) {
        return Err(Error::CredentialStructure(format!(
            "\"{}\" must be a URI: \"{}\"",
            name, value
        )));
    }
    Ok(())
}

impl Credential {
    pub fn from_json(json: &Value) -> Result<Self, Error> {
        serde_json::from_value(json.clone())
            .map_err(|e| Error::CredentialStructure(e.to_string()))
    }

    /// Check the data model requirements of a credential, as of `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), Error> {
        let first_context = self
            .context
            .as_ref()
            .and_then(|context| as_array(context).first().copied());
        if first_context != Some(&Value::String(DEFAULT_CONTEXT.to_string())) {
            return Err(Error::CredentialStructure(format!(
                "\"{}\" needs to be first in the list of contexts",
                DEFAULT_CONTEXT
            )));
        }
        if let Some(ref id) = self.id {
            check_uri("id", id)?;
        }
        match self.type_ {
            Some(ref types) if types.contains(&VERIFIABLE_CREDENTIAL_TYPE.to_string()) => {}
            _ => {
                return Err(Error::CredentialStructure(format!(
                    "\"type\" must include \"{}\"",
                    VERIFIABLE_CREDENTIAL_TYPE
                )))
            }
        }
        let subjects = self.credential_subject.as_ref().ok_or_else(|| {
            Error::CredentialStructure("\"credentialSubject\" property is required".to_string())
        })?;
        for subject in as_array(subjects) {
            if let Some(id) = subject.get("id") {
                let id = id.as_str().ok_or_else(|| {
                    Error::CredentialStructure("\"credentialSubject.id\" must be a string".to_string())
                })?;
                check_uri("credentialSubject.id", id)?;
            }
        }
        match self.issuer {
            Some(Issuer::URI(ref uri)) => check_uri("issuer", uri)?,
            Some(Issuer::Object(ref object)) => check_uri("issuer.id", &object.id)?,
            None => {
                return Err(Error::CredentialStructure(
                    "\"issuer\" property is required".to_string(),
                ))
            }
        }
        let issuance_date = self.issuance_date.as_ref().ok_or_else(|| {
            Error::CredentialStructure("\"issuanceDate\" property is required".to_string())
        })?;
        parse_date_time("issuanceDate", issuance_date)?;
        if let Some(ref expiration_date) = self.expiration_date {
            let expiration = parse_date_time("expirationDate", expiration_date)?;
            if expiration < now {
                return Err(Error::CredentialStructure("Credential has expired".to_string()));
            }
        }
        if let Some(ref status) = self.credential_status {
            match (&status.id, &status.type_) {
                (Some(id), Some(_)) => check_uri("credentialStatus.id", id)?,
                (None, _) => {
                    return Err(Error::CredentialStructure(
                        "\"credentialStatus\" must include an id".to_string(),
                    ))
                }
                (_, None) => {
                    return Err(Error::CredentialStructure(
                        "\"credentialStatus\" must include a type".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Structural checks applied before Ed25519 credential proofs are verified.
pub fn check_credential(document: &Value) -> Result<(), Error> {
    Credential::from_json(document)?.validate(Utc::now())
}
