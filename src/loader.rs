//! Document resolution: a chain of resolvers tried in order, each of which may
//! decline a URI.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde_json::Value;

use crate::error::Error;
use crate::jsonld::{
    AT_CONTEXT, CREDENTIALS_V1_CONTEXT, SECURITY_V1_CONTEXT, SECURITY_V2_CONTEXT,
};

/// Alternate identifier of the credentials v1 context, seen in older documents.
pub const CREDENTIALS_V1_NAMESPACE: &str = "https://www.w3.org/2018/credentials#";

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// URL the document was loaded from, used as base for relative references.
    pub document_url: String,
    pub document: Value,
}

impl RemoteDocument {
    pub fn new(document_url: &str, document: Value) -> Self {
        Self {
            document_url: document_url.to_string(),
            document,
        }
    }
}

#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Resolve `uri`, or return `Ok(None)` to let the next resolver try.
    async fn try_resolve(&self, uri: &str) -> Result<Option<RemoteDocument>, Error>;
}

lazy_static! {
    static ref PACKAGED_CONTEXTS: HashMap<&'static str, Value> = {
        let mut contexts = HashMap::new();
        for (url, source) in &[
            (CREDENTIALS_V1_CONTEXT, vc_verify_contexts::CREDENTIALS_V1),
            (SECURITY_V1_CONTEXT, vc_verify_contexts::SECURITY_V1),
            (SECURITY_V2_CONTEXT, vc_verify_contexts::SECURITY_V2),
        ] {
            match serde_json::from_str(source) {
                Ok(document) => {
                    contexts.insert(*url, document);
                }
                Err(err) => log::error!("packaged context {} is not valid JSON: {}", url, err),
            }
        }
        contexts
    };
}

fn packaged(url: &str) -> Option<Value> {
    PACKAGED_CONTEXTS.get(url).cloned()
}

/// Exact-match override table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    documents: HashMap<String, Value>,
}

impl StaticResolver {
    /// Table with the credentials v1 and security v1 contexts.
    pub fn with_default_contexts() -> Self {
        let mut resolver = Self::default();
        for (uri, url) in &[
            (CREDENTIALS_V1_CONTEXT, CREDENTIALS_V1_CONTEXT),
            (CREDENTIALS_V1_NAMESPACE, CREDENTIALS_V1_CONTEXT),
            (SECURITY_V1_CONTEXT, SECURITY_V1_CONTEXT),
        ] {
            if let Some(document) = packaged(url) {
                resolver.insert(uri, document);
            }
        }
        resolver
    }

    pub fn insert(&mut self, uri: &str, document: Value) {
        self.documents.insert(uri.to_string(), document);
    }

    pub fn with(mut self, uri: &str, document: Value) -> Self {
        self.insert(uri, document);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentResolver for StaticResolver {
    async fn try_resolve(&self, uri: &str) -> Result<Option<RemoteDocument>, Error> {
        Ok(self
            .documents
            .get(uri)
            .map(|document| RemoteDocument::new(uri, document.clone())))
    }
}

/// Packaged well-known security contexts, keyed by URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityContexts;

#[async_trait]
impl DocumentResolver for SecurityContexts {
    async fn try_resolve(&self, uri: &str) -> Result<Option<RemoteDocument>, Error> {
        Ok(match uri {
            SECURITY_V1_CONTEXT | SECURITY_V2_CONTEXT => {
                packaged(uri).map(|document| RemoteDocument::new(uri, document))
            }
            _ => None,
        })
    }
}

/// Contexts given literally as a JSON object in place of a URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineJsonResolver;

#[async_trait]
impl DocumentResolver for InlineJsonResolver {
    async fn try_resolve(&self, uri: &str) -> Result<Option<RemoteDocument>, Error> {
        if !uri.starts_with('{') {
            return Ok(None);
        }
        let parsed: Value = serde_json::from_str(uri)?;
        let document = match parsed {
            Value::Object(ref object) if object.contains_key(AT_CONTEXT) => parsed,
            context => {
                let mut document = serde_json::Map::new();
                document.insert(AT_CONTEXT.to_string(), context);
                Value::Object(document)
            }
        };
        Ok(Some(RemoteDocument::new(uri, document)))
    }
}

/// Network fallback over HTTP(S). Certificate errors are tolerated.
#[derive(Debug, Clone)]
pub struct HttpDocumentLoader {
    client: reqwest::Client,
}

impl HttpDocumentLoader {
    pub fn new() -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "User-Agent",
            reqwest::header::HeaderValue::from_static(crate::USER_AGENT),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentResolver for HttpDocumentLoader {
    async fn try_resolve(&self, uri: &str) -> Result<Option<RemoteDocument>, Error> {
        if !uri.starts_with("http://") && !uri.starts_with("https://") {
            return Ok(None);
        }
        log::info!("fallback url lookup for document: {}", uri);
        let resp = self
            .client
            .get(uri)
            .header("Accept", "application/ld+json, application/json")
            .send()
            .await
            .map_err(|e| Error::Resolution(format!("{}: {}", uri, e)))?;
        if let Err(err) = resp.error_for_status_ref() {
            return Err(Error::Resolution(err.to_string()));
        }
        let document_url = resp.url().to_string();
        let document: Value = resp
            .json()
            .await
            .map_err(|e| Error::Resolution(format!("{}: {}", uri, e)))?;
        Ok(Some(RemoteDocument {
            document_url,
            document,
        }))
    }
}

/// Ordered resolvers; the first one that does not decline wins. Clones share
/// the resolvers.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn DocumentResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: DocumentResolver + 'static>(self, resolver: R) -> Self {
        self.with_shared(Arc::new(resolver))
    }

    /// Append a resolver that is also used elsewhere, such as a network
    /// loader kept for the lifetime of a verifier.
    pub fn with_shared(mut self, resolver: Arc<dyn DocumentResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Static table, packaged security contexts, inline JSON, and optionally
    /// the network.
    pub fn standard(
        overrides: StaticResolver,
        network: Option<Arc<HttpDocumentLoader>>,
    ) -> Self {
        let chain = Self::new()
            .with(overrides)
            .with(SecurityContexts)
            .with(InlineJsonResolver);
        match network {
            Some(loader) => chain.with_shared(loader),
            None => chain,
        }
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub async fn resolve(&self, uri: &str) -> Result<RemoteDocument, Error> {
        log::debug!("checking {}", uri);
        for resolver in &self.resolvers {
            if let Some(document) = resolver.try_resolve(uri).await? {
                return Ok(document);
            }
        }
        Err(Error::Resolution(format!("no resolver for {}", uri)))
    }
}
