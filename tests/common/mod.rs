#![allow(dead_code)]

use hyper::{Body, Response, Server, StatusCode};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair, RsaKeyPair, RSA_PKCS1_SHA256};
use serde_json::{json, Value};

use vc_verify::config::VerifierConfig;
use vc_verify::jws::{self, Algorithm};
use vc_verify::ldp::to_signing_input;
use vc_verify::loader::{ResolverChain, StaticResolver};
use vc_verify::vc::Proof;

pub const DID: &str = "did:india";
pub const CONTROLLER: &str = "https://example.com/i/india";
pub const RSA_PUBLIC_KEY: &str = include_str!("../fixtures/rsa-public.pem");
pub const RSA_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/rsa-private.pk8");
pub const RSA_OTHER_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/rsa-other-private.pk8");
pub const ED25519_SEED: [u8; 32] = [42u8; 32];

pub enum Signer {
    Rsa(RsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

impl Signer {
    pub fn rsa(pkcs8: &[u8]) -> Self {
        Signer::Rsa(RsaKeyPair::from_pkcs8(pkcs8).unwrap())
    }

    pub fn ed25519(seed: &[u8; 32]) -> Self {
        Signer::Ed25519(Ed25519KeyPair::from_seed_unchecked(seed).unwrap())
    }

    fn suite(&self) -> (&'static str, Algorithm) {
        match self {
            Signer::Rsa(_) => ("RsaSignature2018", Algorithm::RS256),
            Signer::Ed25519(_) => ("Ed25519Signature2018", Algorithm::EdDSA),
        }
    }

    fn sign_bytes(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Signer::Rsa(keypair) => {
                let mut signature = vec![0; keypair.public_modulus_len()];
                keypair
                    .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), data, &mut signature)
                    .unwrap();
                signature
            }
            Signer::Ed25519(keypair) => keypair.sign(data).as_ref().to_vec(),
        }
    }

    /// Attach an assertion proof over `document` made by `verification_method`.
    pub async fn sign(&self, document: &Value, verification_method: &str) -> Value {
        self.sign_for(document, verification_method, "assertionMethod")
            .await
    }

    pub async fn sign_for(
        &self,
        document: &Value,
        verification_method: &str,
        proof_purpose: &str,
    ) -> Value {
        let (proof_type, algorithm) = self.suite();
        let mut proof = Proof::new(proof_type);
        proof.created = Some("2021-01-15T17:21:38Z".to_string());
        proof.verification_method = Some(verification_method.to_string());
        proof.proof_purpose = Some(proof_purpose.to_string());
        let verify_data = to_signing_input(document, &proof, &context_resolver())
            .await
            .unwrap();
        let (header_b64, signing_input) =
            jws::prepare_detached_unencoded_payload(algorithm, &verify_data).unwrap();
        let signature = self.sign_bytes(&signing_input);
        proof.jws = Some(jws::complete_sign_unencoded_payload(&header_b64, &signature));
        let mut signed = document.clone();
        signed["proof"] = serde_json::to_value(proof).unwrap();
        signed
    }
}

pub fn ed25519_public_key_base58() -> String {
    let keypair = Ed25519KeyPair::from_seed_unchecked(&ED25519_SEED).unwrap();
    bs58::encode(keypair.public_key().as_ref()).into_string()
}

pub fn context_resolver() -> ResolverChain {
    ResolverChain::standard(StaticResolver::with_default_contexts(), None)
}

pub fn config(signed_key_type: &str) -> VerifierConfig {
    VerifierConfig {
        signed_key_type: signed_key_type.to_string(),
        did: DID.to_string(),
        controller_id: CONTROLLER.to_string(),
        public_key: Some(RSA_PUBLIC_KEY.to_string()),
        public_key_base58: Some(ed25519_public_key_base58()),
        settle_delay_ms: 0,
        network_fallback: false,
        ..Default::default()
    }
}

pub fn credential() -> Value {
    json!({
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            {
                "name": "http://schema.org/name",
                "gender": "http://schema.org/gender",
                "vaccine": "https://example.org/vaccine#name",
                "dose": "https://example.org/vaccine#dose"
            }
        ],
        "type": ["VerifiableCredential"],
        "issuer": CONTROLLER,
        "issuanceDate": "2021-01-15T17:21:37.881Z",
        "credentialSubject": {
            "id": "did:in.gov.uidai.aadhaar:2342343334",
            "name": "Bhaya Mitra",
            "gender": "Male",
            "vaccine": "CoVax",
            "dose": 1
        }
    })
}

/// Local HTTP server answering every request with `status` and `body`.
pub fn http_server(
    status: StatusCode,
    body: &'static str,
) -> Result<(String, impl FnOnce() -> Result<(), ()>), hyper::Error> {
    use hyper::service::{make_service_fn, service_fn};
    let addr = ([127, 0, 0, 1], 0).into();
    let make_svc = make_service_fn(move |_| async move {
        Ok::<_, hyper::Error>(service_fn(move |_req| async move {
            let (mut parts, _) = Response::<Body>::default().into_parts();
            parts.status = status;
            Ok::<_, hyper::Error>(Response::from_parts(parts, Body::from(body)))
        }))
    });
    let server = Server::try_bind(&addr)?.serve(make_svc);
    let url = "http://".to_string() + &server.local_addr().to_string();
    let (shutdown_tx, shutdown_rx) = futures::channel::oneshot::channel();
    let graceful = server.with_graceful_shutdown(async {
        shutdown_rx.await.ok();
    });
    tokio::task::spawn(async move {
        graceful.await.ok();
    });
    let shutdown = || shutdown_tx.send(());
    Ok((url, shutdown))
}
