//! Linked data proof verification for the configured signature suites.

use serde_json::Value;

use crate::error::Error;
use crate::hash::sha256;
use crate::jsonld::{json_to_dataset, AT_CONTEXT};
use crate::jws::{self, Algorithm};
use crate::key::{KeyType, SigningAlgorithm, VerificationKey};
use crate::loader::ResolverChain;
use crate::purpose::{AssertionProofPurpose, VerificationMethod};
use crate::urdna2015;
use crate::vc::{check_credential, Proof};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofSuite {
    RsaSignature2018,
    Ed25519Signature2018,
}

impl ProofSuite {
    pub fn for_algorithm(algorithm: SigningAlgorithm) -> Self {
        match algorithm {
            SigningAlgorithm::Rsa => Self::RsaSignature2018,
            SigningAlgorithm::Ed25519 => Self::Ed25519Signature2018,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RsaSignature2018 => "RsaSignature2018",
            Self::Ed25519Signature2018 => "Ed25519Signature2018",
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::RsaSignature2018 => Algorithm::RS256,
            Self::Ed25519Signature2018 => Algorithm::EdDSA,
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Self::RsaSignature2018 => KeyType::RsaVerificationKey2018,
            Self::Ed25519Signature2018 => KeyType::Ed25519VerificationKey2018,
        }
    }

    /// Whether the credential data model is checked along with the proof.
    pub fn checks_credential(&self) -> bool {
        matches!(self, Self::Ed25519Signature2018)
    }
}

/// Result of checking a document's proofs. Cryptographic and authorization
/// failures are reported here rather than as errors.
#[derive(Debug)]
pub struct VerificationResult {
    pub verified: bool,
    pub error: Option<Error>,
}

impl VerificationResult {
    fn success() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    fn failure(error: Error) -> Self {
        Self {
            verified: false,
            error: Some(error),
        }
    }
}

/// URDNA2015 N-Quads of a JSON-LD document.
pub async fn canonicalize(document: &Value, resolver: &ResolverChain) -> Result<String, Error> {
    let dataset = json_to_dataset(document, resolver).await?;
    urdna2015::normalize(&dataset)?.to_nquads()
}

/// Data a proof signs: the hash of the canonical proof options followed by
/// the hash of the canonical document. `document` must not carry the proof.
pub async fn to_signing_input(
    document: &Value,
    proof: &Proof,
    resolver: &ResolverChain,
) -> Result<Vec<u8>, Error> {
    let options = proof.to_options(document.get(AT_CONTEXT))?;
    let sigopts_normalized = canonicalize(&options, resolver).await?;
    let doc_normalized = canonicalize(document, resolver).await?;
    let sigopts_digest = sha256(sigopts_normalized.as_bytes())?;
    let doc_digest = sha256(doc_normalized.as_bytes())?;
    Ok([sigopts_digest, doc_digest].concat())
}

/// Whether a raw proof is declared with the given type.
fn has_type(proof: &Value, type_name: &str) -> bool {
    proof.get("type").and_then(Value::as_str) == Some(type_name)
}

/// Detach the proofs from `document`. Errors if there are none.
fn take_proofs(document: &Value) -> Result<(Value, Vec<Value>), Error> {
    let mut document = document.clone();
    let object = document.as_object_mut().ok_or(Error::ExpectedObject)?;
    let proofs = match object.remove("proof") {
        Some(Value::Null) | None => return Err(Error::MissingProof),
        Some(Value::Array(proofs)) => proofs,
        Some(proof) => vec![proof],
    };
    Ok((document, proofs))
}

/// Verify the proofs of `document` made with `suite` by `key` for `purpose`.
///
/// Returns `Err` only for structurally malformed input: a non-object
/// document, a missing proof, or a matching proof without a signature or
/// verification method.
pub async fn verify(
    document: &Value,
    suite: ProofSuite,
    key: &VerificationKey,
    purpose: &AssertionProofPurpose,
    resolver: &ResolverChain,
) -> Result<VerificationResult, Error> {
    let (unsigned, proofs) = take_proofs(document)?;
    let mut candidates = Vec::new();
    for proof in proofs {
        if !has_type(&proof, suite.type_name()) {
            continue;
        }
        let proof: Proof =
            serde_json::from_value(proof).map_err(|e| Error::InvalidProof(e.to_string()))?;
        if proof.jws.is_none() {
            return Err(Error::MissingProofSignature);
        }
        if proof.verification_method().is_none() {
            return Err(Error::MissingVerificationMethod);
        }
        candidates.push(proof);
    }
    if candidates.is_empty() {
        return Ok(VerificationResult::failure(Error::NoMatchingProof));
    }
    if suite.checks_credential() {
        if let Err(err) = check_credential(document) {
            return Ok(VerificationResult::failure(err));
        }
    }
    let mut first_error = None;
    for proof in &candidates {
        match verify_proof(&unsigned, proof, suite, key, purpose, resolver).await {
            Ok(()) => return Ok(VerificationResult::success()),
            Err(err) => {
                log::debug!("{} proof failed: {}", suite.type_name(), err);
                first_error.get_or_insert(err);
            }
        }
    }
    Ok(VerificationResult {
        verified: false,
        error: first_error,
    })
}

async fn verify_proof(
    unsigned: &Value,
    proof: &Proof,
    suite: ProofSuite,
    key: &VerificationKey,
    purpose: &AssertionProofPurpose,
    resolver: &ResolverChain,
) -> Result<(), Error> {
    let jws = proof.jws.as_ref().ok_or(Error::MissingProofSignature)?;
    let method_id = proof
        .verification_method()
        .ok_or(Error::MissingVerificationMethod)?;
    let method = VerificationMethod::dereference(method_id, key, resolver).await?;
    let verify_data = to_signing_input(unsigned, proof, resolver).await?;
    jws::detached_verify(jws, &verify_data, suite.algorithm(), &key.public_key).map_err(
        |err| match err {
            Error::RingError(_) => Error::SignatureInvalid,
            err => err,
        },
    )?;
    purpose.validate(proof, &method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PublicKey;
    use crate::loader::StaticResolver;
    use crate::purpose::build_authorization;
    use ring::digest::{digest, SHA256};
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use serde_json::json;

    const DID: &str = "did:india";
    const CONTROLLER: &str = "https://example.com/i/india";

    const CREDENTIAL_NQUADS: &str = r#"<did:example:subject> <http://schema.org/name> "Sample Subject" .
_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .
_:c14n0 <https://www.w3.org/2018/credentials#credentialSubject> <did:example:subject> .
_:c14n0 <https://www.w3.org/2018/credentials#issuanceDate> "2021-01-15T17:21:37Z"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
_:c14n0 <https://www.w3.org/2018/credentials#issuer> <https://example.com/i/india> .
"#;

    const RSA_OPTIONS_NQUADS: &str = r#"_:c14n0 <http://purl.org/dc/terms/created> "2021-01-15T17:21:38Z"^^<http://www.w3.org/2001/XMLSchema#dateTime> .
_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/security#RsaSignature2018> .
_:c14n0 <https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> .
_:c14n0 <https://w3id.org/security#verificationMethod> <did:india> .
"#;

    fn keypair() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed_unchecked(&[11u8; 32]).unwrap()
    }

    fn key() -> VerificationKey {
        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(keypair().public_key().as_ref());
        VerificationKey {
            id: DID.to_string(),
            type_: KeyType::Ed25519VerificationKey2018,
            controller: CONTROLLER.to_string(),
            public_key: PublicKey::Ed25519(public_key),
            encoded: bs58::encode(public_key).into_string(),
        }
    }

    fn resolver(key: &VerificationKey) -> ResolverChain {
        ResolverChain::standard(
            StaticResolver::with_default_contexts().with(DID, key.to_document()),
            None,
        )
    }

    fn credential() -> Value {
        json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                {"name": "http://schema.org/name"}
            ],
            "type": ["VerifiableCredential"],
            "issuer": CONTROLLER,
            "issuanceDate": "2021-01-15T17:21:37Z",
            "credentialSubject": {
                "id": "did:example:subject",
                "name": "Sample Subject"
            }
        })
    }

    async fn sign(document: &Value, resolver: &ResolverChain) -> Value {
        let mut proof = Proof::new("Ed25519Signature2018");
        proof.created = Some("2021-01-15T17:21:38Z".to_string());
        proof.verification_method = Some(DID.to_string());
        proof.proof_purpose = Some("assertionMethod".to_string());
        let verify_data = to_signing_input(document, &proof, resolver).await.unwrap();
        let (header_b64, signing_input) =
            jws::prepare_detached_unencoded_payload(Algorithm::EdDSA, &verify_data).unwrap();
        let signature = keypair().sign(&signing_input);
        proof.jws = Some(jws::complete_sign_unencoded_payload(
            &header_b64,
            signature.as_ref(),
        ));
        let mut signed = document.clone();
        signed["proof"] = serde_json::to_value(proof).unwrap();
        signed
    }

    #[tokio::test]
    async fn canonical_credential() {
        let key = key();
        let nquads = canonicalize(&credential(), &resolver(&key)).await.unwrap();
        assert_eq!(nquads, CREDENTIAL_NQUADS);
    }

    #[tokio::test]
    async fn canonical_proof_options() {
        let key = key();
        let mut proof = Proof::new("RsaSignature2018");
        proof.created = Some("2021-01-15T17:21:38Z".to_string());
        proof.verification_method = Some(DID.to_string());
        proof.proof_purpose = Some("assertionMethod".to_string());
        proof.jws = Some("eyJhbGciOiJSUzI1NiJ9..c2ln".to_string());
        let options = proof.to_options(credential().get(AT_CONTEXT)).unwrap();
        assert!(options.get("jws").is_none());
        let nquads = canonicalize(&options, &resolver(&key)).await.unwrap();
        assert_eq!(nquads, RSA_OPTIONS_NQUADS);
    }

    /// A proof built from fixed canonical N-Quads and a hand-written JWS,
    /// as another implementation would produce it.
    #[tokio::test]
    async fn verify_externally_signed_credential() {
        let key = key();
        let resolver = resolver(&key);
        let (_, purpose) = build_authorization(&key, CONTROLLER);
        let options_nquads = RSA_OPTIONS_NQUADS.replace(
            "security#RsaSignature2018",
            "security#Ed25519Signature2018",
        );
        let mut verify_data = digest(&SHA256, options_nquads.as_bytes()).as_ref().to_vec();
        verify_data.extend_from_slice(digest(&SHA256, CREDENTIAL_NQUADS.as_bytes()).as_ref());
        let header = base64::encode_config(
            r#"{"alg":"EdDSA","b64":false,"crit":["b64"]}"#,
            base64::URL_SAFE_NO_PAD,
        );
        let mut signing_input = format!("{}.", header).into_bytes();
        signing_input.extend_from_slice(&verify_data);
        let signature = keypair().sign(&signing_input);
        let mut signed = credential();
        signed["proof"] = json!({
            "type": "Ed25519Signature2018",
            "created": "2021-01-15T17:21:38Z",
            "proofPurpose": "assertionMethod",
            "verificationMethod": DID,
            "jws": format!(
                "{}..{}",
                header,
                base64::encode_config(signature.as_ref(), base64::URL_SAFE_NO_PAD)
            )
        });
        let suite = ProofSuite::Ed25519Signature2018;
        let result = verify(&signed, suite, &key, &purpose, &resolver).await.unwrap();
        assert!(result.verified, "{:?}", result.error);
    }

    #[tokio::test]
    async fn unrelated_proofs_are_skipped() {
        let key = key();
        let resolver = resolver(&key);
        let (_, purpose) = build_authorization(&key, CONTROLLER);
        let signed = sign(&credential(), &resolver).await;
        let mut document = signed.clone();
        document["proof"] = json!([
            {
                "type": "BbsBlsSignature2020",
                "verificationMethod": {"id": "did:example:other#key-1"},
                "proofValue": "kTTbA3pmDa6Qia/JkOnIXDLmoBz3vsi7"
            },
            signed["proof"].clone()
        ]);
        let suite = ProofSuite::Ed25519Signature2018;
        let result = verify(&document, suite, &key, &purpose, &resolver).await.unwrap();
        assert!(result.verified, "{:?}", result.error);
    }

    #[tokio::test]
    async fn verify_ed25519_credential() {
        let key = key();
        let resolver = resolver(&key);
        let (_, purpose) = build_authorization(&key, CONTROLLER);
        let signed = sign(&credential(), &resolver).await;
        let suite = ProofSuite::Ed25519Signature2018;
        let result = verify(&signed, suite, &key, &purpose, &resolver).await.unwrap();
        assert!(result.verified, "{:?}", result.error);

        let mut tampered = signed.clone();
        tampered["credentialSubject"]["name"] = json!("Someone Else");
        let result = verify(&tampered, suite, &key, &purpose, &resolver).await.unwrap();
        assert!(!result.verified);
        assert!(matches!(result.error, Some(Error::SignatureInvalid)));
    }

    #[tokio::test]
    async fn unmatched_or_missing_proofs() {
        let key = key();
        let resolver = resolver(&key);
        let (_, purpose) = build_authorization(&key, CONTROLLER);
        let signed = sign(&credential(), &resolver).await;

        let result = verify(&signed, ProofSuite::RsaSignature2018, &key, &purpose, &resolver)
            .await
            .unwrap();
        assert!(matches!(result.error, Some(Error::NoMatchingProof)));

        let err = verify(&credential(), ProofSuite::Ed25519Signature2018, &key, &purpose, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingProof));

        let mut unsigned = signed.clone();
        unsigned["proof"].as_object_mut().unwrap().remove("jws");
        let err = verify(&unsigned, ProofSuite::Ed25519Signature2018, &key, &purpose, &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingProofSignature));
    }

    #[tokio::test]
    async fn purpose_and_structure_failures() {
        let key = key();
        let resolver = resolver(&key);
        let (_, purpose) = build_authorization(&key, CONTROLLER);
        let suite = ProofSuite::Ed25519Signature2018;

        let mut signed = sign(&credential(), &resolver).await;
        signed["proof"]["proofPurpose"] = json!("authentication");
        let result = verify(&signed, suite, &key, &purpose, &resolver).await.unwrap();
        // the purpose is covered by the signature
        assert!(matches!(result.error, Some(Error::SignatureInvalid)));

        let mut document = credential();
        document.as_object_mut().unwrap().remove("issuanceDate");
        let signed = sign(&document, &resolver).await;
        let result = verify(&signed, suite, &key, &purpose, &resolver).await.unwrap();
        assert!(matches!(result.error, Some(Error::CredentialStructure(_))));
    }
}
