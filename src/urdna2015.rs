use std::collections::BTreeMap as Map;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::hash::sha256_hex;
use crate::rdf::{DataSet, Predicate, Statement};

/// <https://json-ld.github.io/normalization/spec/#normalization-state>
#[derive(Debug, Clone)]
pub struct NormalizationState {
    pub blank_node_to_quads: Map<String, Vec<Statement>>,
    pub hash_to_blank_nodes: Map<String, Vec<String>>,
    pub canonical_issuer: IdentifierIssuer,
}

/// <https://json-ld.github.io/normalization/spec/#blank-node-identifier-issuer-state>
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    pub identifier_prefix: String,
    pub identifier_counter: u64,
    /// (issued identifier, existing identifier), in issuance order
    pub issued_identifiers_list: Vec<(String, String)>,
}

impl IdentifierIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            identifier_prefix: prefix.to_string(),
            identifier_counter: 0,
            issued_identifiers_list: Vec::new(),
        }
    }

    pub fn find_issued_identifier(&self, existing_identifier: &str) -> Option<&str> {
        self.issued_identifiers_list
            .iter()
            .find(|(_, existing_id)| existing_id == existing_identifier)
            .map(|(issued_identifier, _)| issued_identifier.as_ref())
    }

    /// <https://json-ld.github.io/normalization/spec/#issue-identifier-algorithm>
    pub fn issue(&mut self, existing_identifier: &str) -> String {
        // 1
        if let Some(id) = self.find_issued_identifier(existing_identifier) {
            return id.to_string();
        }
        // 2
        let issued_identifier = format!("{}{}", self.identifier_prefix, self.identifier_counter);
        // 3
        self.issued_identifiers_list
            .push((issued_identifier.clone(), existing_identifier.to_string()));
        // 4
        self.identifier_counter += 1;
        // 5
        issued_identifier
    }
}

#[derive(Debug, Clone)]
pub struct HashNDegreeQuadsOutput {
    pub hash: String,
    pub issuer: IdentifierIssuer,
}

/// All orderings of `items`.
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let item = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, item.clone());
            out.push(tail);
        }
    }
    out
}

/// <https://json-ld.github.io/normalization/spec/#hash-first-degree-quads>
pub fn hash_first_degree_quads(
    normalization_state: &NormalizationState,
    reference_blank_node_identifier: &str,
) -> Result<String, Error> {
    // 1
    let mut nquads: Vec<String> = Vec::new();
    // 2
    if let Some(quads) = normalization_state
        .blank_node_to_quads
        .get(reference_blank_node_identifier)
    {
        // 3
        for quad in quads {
            // 3.1
            let mut quad = quad.clone();
            // 3.1.1
            for label in quad.blank_node_components_mut() {
                // 3.1.1.1
                label.0 = if label.0 == reference_blank_node_identifier {
                    "_:a".to_string()
                } else {
                    "_:z".to_string()
                };
            }
            nquads.push(String::from(&quad));
        }
    }
    // 4
    nquads.sort();
    // 5
    sha256_hex(nquads.join("").as_bytes())
}

/// <https://json-ld.github.io/normalization/spec/#hash-related-blank-node>
pub fn hash_related_blank_node(
    normalization_state: &NormalizationState,
    related: &str,
    quad: &Statement,
    issuer: &IdentifierIssuer,
    position: char,
) -> Result<String, Error> {
    // 1
    let identifier = match normalization_state
        .canonical_issuer
        .find_issued_identifier(related)
    {
        Some(id) => id.to_string(),
        None => match issuer.find_issued_identifier(related) {
            Some(id) => id.to_string(),
            None => hash_first_degree_quads(normalization_state, related)?,
        },
    };
    // 2
    let mut input = position.to_string();
    // 3
    if position != 'g' {
        let Predicate::IRIRef(ref predicate) = quad.predicate;
        input.push('<');
        input.push_str(&predicate.0);
        input.push('>');
    }
    // 4
    input += &identifier;
    // 5
    sha256_hex(input.as_bytes())
}

/// <https://json-ld.github.io/normalization/spec/#hash-n-degree-quads>
pub fn hash_n_degree_quads(
    normalization_state: &NormalizationState,
    identifier: &str,
    issuer: IdentifierIssuer,
) -> Result<HashNDegreeQuadsOutput, Error> {
    let mut issuer = issuer;
    // 1
    let mut hash_to_related_blank_nodes: Map<String, Vec<String>> = Map::new();
    // 2
    if let Some(quads) = normalization_state.blank_node_to_quads.get(identifier) {
        // 3
        for quad in quads {
            // 3.1
            for (component, position) in quad.blank_node_components_with_position() {
                if component.0 == identifier {
                    continue;
                }
                // 3.1.1
                let hash = hash_related_blank_node(
                    normalization_state,
                    &component.0,
                    quad,
                    &issuer,
                    position,
                )?;
                // 3.1.2
                hash_to_related_blank_nodes
                    .entry(hash)
                    .or_insert_with(Vec::new)
                    .push(component.0.clone());
            }
        }
    }
    // 4
    let mut data_to_hash = String::new();
    // 5
    for (related_hash, blank_node_list) in hash_to_related_blank_nodes {
        // 5.1
        data_to_hash.push_str(&related_hash);
        // 5.2
        let mut chosen_path = String::new();
        // 5.3
        let mut chosen_issuer = None;
        // 5.4
        'permutation: for permutation in permutations(&blank_node_list) {
            // 5.4.1
            let mut issuer_copy = issuer.clone();
            // 5.4.2
            let mut path = String::new();
            // 5.4.3
            let mut recursion_list: Vec<String> = Vec::new();
            // 5.4.4
            for related in permutation {
                if let Some(canonical_identifier) = normalization_state
                    .canonical_issuer
                    .find_issued_identifier(&related)
                {
                    // 5.4.4.1
                    path.push_str(canonical_identifier);
                } else {
                    // 5.4.4.2
                    if issuer_copy.find_issued_identifier(&related).is_none() {
                        recursion_list.push(related.clone());
                    }
                    path.push_str(&issuer_copy.issue(&related));
                }
                // 5.4.4.3
                if !chosen_path.is_empty() && path > chosen_path {
                    continue 'permutation;
                }
            }
            // 5.4.5
            for related in recursion_list {
                // 5.4.5.1
                let result = hash_n_degree_quads(normalization_state, &related, issuer_copy.clone())?;
                // 5.4.5.2
                path.push_str(&issuer_copy.issue(&related));
                // 5.4.5.3
                path.push('<');
                path.push_str(&result.hash);
                path.push('>');
                // 5.4.5.4
                issuer_copy = result.issuer;
                // 5.4.5.5
                if !chosen_path.is_empty() && path > chosen_path {
                    continue 'permutation;
                }
            }
            // 5.4.6
            if chosen_path.is_empty() || path < chosen_path {
                chosen_path = path;
                chosen_issuer = Some(issuer_copy);
            }
        }
        // 5.5
        data_to_hash.push_str(&chosen_path);
        // 5.6
        issuer = chosen_issuer.ok_or(Error::MissingChosenIssuer)?;
    }
    // 6
    Ok(HashNDegreeQuadsOutput {
        hash: sha256_hex(data_to_hash.as_bytes())?,
        issuer,
    })
}

/// Canonicalize a dataset with URDNA2015, relabelling blank nodes `_:c14n0`, `_:c14n1`, ...
///
/// <https://json-ld.github.io/normalization/spec/#canonicalization-algorithm>
pub fn normalize(input_dataset: &DataSet) -> Result<DataSet, Error> {
    // 1
    let mut normalization_state = NormalizationState {
        blank_node_to_quads: Map::new(),
        hash_to_blank_nodes: Map::new(),
        canonical_issuer: IdentifierIssuer::new("_:c14n"),
    };
    // 2
    for quad in input_dataset.statements() {
        // 2.1
        for blank_node_identifier in quad.blank_node_components() {
            let quads = normalization_state
                .blank_node_to_quads
                .entry(blank_node_identifier.0.clone())
                .or_insert_with(Vec::new);
            if !quads.contains(quad) {
                quads.push(quad.clone());
            }
        }
    }
    // 3
    let mut non_normalized_identifiers: BTreeSet<String> = normalization_state
        .blank_node_to_quads
        .keys()
        .cloned()
        .collect();
    // 4
    let mut simple = true;
    // 5
    while simple {
        // 5.1
        simple = false;
        // 5.2
        normalization_state.hash_to_blank_nodes.clear();
        // 5.3
        for identifier in non_normalized_identifiers.iter() {
            // 5.3.1
            let hash = hash_first_degree_quads(&normalization_state, identifier)?;
            // 5.3.2
            normalization_state
                .hash_to_blank_nodes
                .entry(hash)
                .or_insert_with(Vec::new)
                .push(identifier.clone());
        }
        // 5.4
        let unique: Vec<(String, String)> = normalization_state
            .hash_to_blank_nodes
            .iter()
            .filter(|(_, identifier_list)| identifier_list.len() == 1)
            .map(|(hash, identifier_list)| (hash.clone(), identifier_list[0].clone()))
            .collect();
        for (hash, identifier) in unique {
            // 5.4.2
            normalization_state.canonical_issuer.issue(&identifier);
            // 5.4.3
            non_normalized_identifiers.remove(&identifier);
            // 5.4.4
            normalization_state.hash_to_blank_nodes.remove(&hash);
            // 5.4.5
            simple = true;
        }
    }
    // 6
    let shared_hashes = normalization_state.hash_to_blank_nodes.clone();
    for (_hash, identifier_list) in shared_hashes {
        // 6.1
        let mut hash_path_list: Vec<HashNDegreeQuadsOutput> = Vec::new();
        // 6.2
        for identifier in identifier_list {
            // 6.2.1
            if normalization_state
                .canonical_issuer
                .find_issued_identifier(&identifier)
                .is_some()
            {
                continue;
            }
            // 6.2.2
            let mut temporary_issuer = IdentifierIssuer::new("_:b");
            // 6.2.3
            temporary_issuer.issue(&identifier);
            // 6.2.4
            hash_path_list.push(hash_n_degree_quads(
                &normalization_state,
                &identifier,
                temporary_issuer,
            )?);
        }
        // 6.3
        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            // 6.3.1
            for (_, existing_identifier) in result.issuer.issued_identifiers_list {
                normalization_state
                    .canonical_issuer
                    .issue(&existing_identifier);
            }
        }
    }
    // 7
    let mut normalized_dataset = DataSet::default();
    for quad in input_dataset.statements() {
        // 7.1
        let mut quad_copy = quad.clone();
        for label in quad_copy.blank_node_components_mut() {
            let canonical_identifier = normalization_state
                .canonical_issuer
                .find_issued_identifier(&label.0)
                .ok_or(Error::MissingIdentifier)?;
            label.0 = canonical_identifier.to_string();
        }
        // 7.2
        normalized_dataset.add_statement(quad_copy);
    }
    // 8
    Ok(normalized_dataset)
}
