//! Conversion of JSON-LD documents to RDF datasets with the `json-ld` crate.
//! Every remote context is loaded through a [`ResolverChain`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use iref::{Iri, IriBuf, IriRef};
use json_ld::{JsonLdProcessor, LoadError, Loader};
use rdf_types::{generator, Quad};
use serde_json::Value;

use crate::error::Error;
use crate::loader::ResolverChain;
use crate::rdf::DataSet;

pub const AT_CONTEXT: &str = "@context";

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const SECURITY_V1_CONTEXT: &str = "https://w3id.org/security/v1";
pub const SECURITY_V2_CONTEXT: &str = "https://w3id.org/security/v2";

/// Maximum number of distinct documents loaded while processing one document.
pub const MAX_REMOTE_CONTEXTS: usize = 32;

/// Absolute IRI check.
pub fn is_iri(string: &str) -> bool {
    Iri::new(string).is_ok()
}

/// Resolve `reference` against `base`. References that are already absolute,
/// or that cannot be parsed as IRI references, are returned unchanged.
pub fn resolve_reference(reference: &str, base: Option<&str>) -> String {
    if is_iri(reference) {
        return reference.to_string();
    }
    let base = match base.and_then(|base| Iri::new(base).ok()) {
        Some(base) => base,
        None => return reference.to_string(),
    };
    match IriRef::new(reference) {
        Ok(iri_ref) => iri_ref.resolved(base).as_str().to_string(),
        Err(_) => reference.to_string(),
    }
}

/// Wrap a value in an array unless it is one already.
pub fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        value => vec![value],
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Unloadable(String);

/// `json_ld::Loader` over a resolver chain. Loads are cached by IRI and
/// capped at [`MAX_REMOTE_CONTEXTS`]; the first failure is kept so that it
/// can be reported instead of the processor's error.
struct ChainLoader {
    resolver: ResolverChain,
    loaded: AtomicUsize,
    cache: Mutex<HashMap<IriBuf, json_ld::RemoteDocument>>,
    failure: Mutex<Option<Error>>,
}

impl ChainLoader {
    fn new(resolver: ResolverChain) -> Self {
        Self {
            resolver,
            loaded: AtomicUsize::new(0),
            cache: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
        }
    }

    fn cached(&self, url: &Iri) -> Option<json_ld::RemoteDocument> {
        let cache = self.cache.lock().ok()?;
        cache.get(url).cloned()
    }

    async fn fetch(&self, url: &Iri) -> Result<json_ld::RemoteDocument, Error> {
        if let Some(document) = self.cached(url) {
            return Ok(document);
        }
        if self.loaded.fetch_add(1, Ordering::SeqCst) >= MAX_REMOTE_CONTEXTS {
            return Err(Error::ContextOverflow(MAX_REMOTE_CONTEXTS));
        }
        let remote = self.resolver.resolve(url.as_str()).await?;
        let document_url = IriBuf::new(remote.document_url).unwrap_or_else(|_| url.to_owned());
        let content: json_syntax::Value = serde_json::from_value(remote.document)?;
        let document = json_ld::RemoteDocument::new(Some(document_url), None, content);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_owned(), document.clone());
        }
        Ok(document)
    }

    fn record(&self, err: Error) {
        if let Ok(mut failure) = self.failure.lock() {
            failure.get_or_insert(err);
        }
    }

    fn take_failure(&self) -> Option<Error> {
        self.failure.lock().ok()?.take()
    }

    /// Expand `input` and serialize its RDF dataset as unsorted N-Quads.
    async fn to_nquads(self, input: json_syntax::Value) -> Result<String, Error> {
        let document: json_ld::RemoteDocument = json_ld::RemoteDocument::new(None, None, input);
        let mut generator = generator::Blank::new();
        let mut to_rdf = match document.to_rdf(&mut generator, &self).await {
            Ok(to_rdf) => to_rdf,
            Err(err) => {
                return Err(self
                    .take_failure()
                    .unwrap_or_else(|| Error::JsonLd(err.to_string())))
            }
        };
        let mut nquads = String::new();
        for Quad(subject, predicate, object, graph) in to_rdf.cloned_quads() {
            // generalized RDF is not produced
            if let Some(predicate) = predicate.into_iri() {
                nquads.push_str(&format!("{} .\n", Quad(subject, predicate, object, graph)));
            }
        }
        Ok(nquads)
    }
}

impl Loader for ChainLoader {
    async fn load(&self, url: &Iri) -> json_ld::LoadingResult {
        self.fetch(url).await.map_err(|err| {
            log::debug!("unable to load {}: {}", url, err);
            let cause = Unloadable(err.to_string());
            self.record(err);
            LoadError::new(url.to_owned(), cause)
        })
    }
}

/// Replace top-level `@context` entries written as literal JSON text with the
/// context the resolver chain parses from them.
async fn inline_contexts(document: &Value, resolver: &ResolverChain) -> Result<Value, Error> {
    let mut document = document.clone();
    let entries: Vec<&mut Value> = match document.get_mut(AT_CONTEXT) {
        Some(Value::Array(entries)) => entries.iter_mut().collect(),
        Some(entry) => vec![entry],
        None => Vec::new(),
    };
    for entry in entries {
        let text = match &*entry {
            Value::String(text) if text.trim_start().starts_with('{') => text.clone(),
            _ => continue,
        };
        let remote = resolver.resolve(&text).await?;
        *entry = remote.document.get(AT_CONTEXT).cloned().unwrap_or(Value::Null);
    }
    Ok(document)
}

/// <https://w3c.github.io/json-ld-api/#dom-jsonldprocessor-tordf>
///
/// JSON-LD processing futures are not `Send`, so the processor runs on the
/// blocking pool while documents are still loaded on the current runtime.
pub async fn json_to_dataset(document: &Value, resolver: &ResolverChain) -> Result<DataSet, Error> {
    let document = inline_contexts(document, resolver).await?;
    let input: json_syntax::Value = serde_json::from_value(document)?;
    let loader = ChainLoader::new(resolver.clone());
    let runtime = tokio::runtime::Handle::current();
    let nquads = tokio::task::spawn_blocking(move || runtime.block_on(loader.to_nquads(input)))
        .await
        .map_err(|err| Error::JsonLd(err.to_string()))??;
    DataSet::from_str(&nquads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{DocumentResolver, RemoteDocument, StaticResolver};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn iris() {
        assert!(is_iri("https://www.w3.org/2018/credentials/v1"));
        assert!(is_iri("did:india"));
        assert!(!is_iri("_:b0"));
        assert!(!is_iri("relative/path"));
    }

    #[test]
    fn resolve_references() {
        assert_eq!(
            resolve_reference("v2", Some("https://w3id.org/security/v1")),
            "https://w3id.org/security/v2"
        );
        assert_eq!(
            resolve_reference("https://example.org/ctx", Some("https://w3id.org/")),
            "https://example.org/ctx"
        );
        assert_eq!(resolve_reference("ctx.jsonld", None), "ctx.jsonld");
    }

    /// Answers every URI with a context that refers to a longer URI.
    struct EndlessContexts {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DocumentResolver for EndlessContexts {
        async fn try_resolve(&self, uri: &str) -> Result<Option<RemoteDocument>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = format!("{}x", uri);
            Ok(Some(RemoteDocument::new(uri, json!({ "@context": next }))))
        }
    }

    #[tokio::test]
    async fn remote_context_limit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = ResolverChain::new().with(EndlessContexts {
            calls: calls.clone(),
        });
        let document = json!({
            "@context": "https://example.org/ctx",
            "@id": "https://example.org/thing",
            "https://example.org/name": "thing"
        });
        let err = json_to_dataset(&document, &resolver).await.unwrap_err();
        assert!(matches!(err, Error::ContextOverflow(MAX_REMOTE_CONTEXTS)), "{}", err);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_REMOTE_CONTEXTS);
    }

    #[tokio::test]
    async fn json_literals_are_opaque() {
        let resolver = ResolverChain::standard(StaticResolver::default(), None);
        let document = json!({
            "@context": {
                "data": {"@id": "https://example.org/data", "@type": "@json"}
            },
            "@id": "https://example.org/thing",
            "data": {"@context": "https://unreachable.example/ctx", "a": 1}
        });
        let dataset = json_to_dataset(&document, &resolver).await.unwrap();
        assert_eq!(
            dataset.to_nquads().unwrap(),
            "<https://example.org/thing> <https://example.org/data> \
             \"{\\\"@context\\\":\\\"https://unreachable.example/ctx\\\",\\\"a\\\":1}\"\
             ^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON> .\n"
        );
    }

    #[tokio::test]
    async fn unresolvable_context() {
        let resolver = ResolverChain::standard(StaticResolver::default(), None);
        let document = json!({
            "@context": "https://example.org/missing",
            "https://example.org/name": "thing"
        });
        let err = json_to_dataset(&document, &resolver).await.unwrap_err();
        assert!(matches!(err, Error::Resolution(_)), "{}", err);
    }

    #[tokio::test]
    async fn inline_json_context() {
        let resolver = ResolverChain::standard(StaticResolver::default(), None);
        let document = json!({
            "@context": ["{\"name\": \"http://schema.org/name\"}"],
            "@id": "https://example.org/thing",
            "name": "thing"
        });
        let dataset = json_to_dataset(&document, &resolver).await.unwrap();
        assert_eq!(
            dataset.to_nquads().unwrap(),
            "<https://example.org/thing> <http://schema.org/name> \"thing\" .\n"
        );
    }
}
