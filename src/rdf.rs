use std::convert::TryFrom;
use std::str::FromStr;

use crate::error::Error;
use crate::jsonld::is_iri;

// https://json-ld.github.io/normalization/spec/
// https://www.w3.org/TR/n-quads/#terminals

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// An RDF dataset. Statements are kept unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Object,
    pub graph_label: Option<GraphLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    IRIRef(IRIRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphLabel {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IRIRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNodeLabel(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String {
        string: StringLiteral,
    },
    Typed {
        string: StringLiteral,
        type_: IRIRef,
    },
    LangTagged {
        string: StringLiteral,
        lang: Lang,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringLiteral(pub String);

/// BCP47-shaped language tag: `[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lang(String);

impl FromStr for Lang {
    type Err = Error;
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut subtags = tag.split('-');
        let primary = subtags.next().unwrap_or("");
        let valid_subtag = |s: &str, alpha_only: bool| {
            (1..=8).contains(&s.len())
                && s.chars().all(|c| {
                    if alpha_only {
                        c.is_ascii_alphabetic()
                    } else {
                        c.is_ascii_alphanumeric()
                    }
                })
        };
        if !valid_subtag(primary, true) || !subtags.all(|s| valid_subtag(s, false)) {
            return Err(Error::InvalidNQuad(format!("invalid language tag: {}", tag)));
        }
        Ok(Lang(tag.to_string()))
    }
}

impl Lang {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn node_from_id(id: String) -> Result<Result<IRIRef, BlankNodeLabel>, Error> {
    if id.starts_with("_:") {
        Ok(Err(BlankNodeLabel(id)))
    } else if is_iri(&id) {
        Ok(Ok(IRIRef(id)))
    } else {
        Err(Error::InvalidIri(id))
    }
}

impl TryFrom<String> for Subject {
    type Error = Error;
    fn try_from(id: String) -> Result<Self, Self::Error> {
        Ok(match node_from_id(id)? {
            Ok(iri) => Subject::IRIRef(iri),
            Err(label) => Subject::BlankNodeLabel(label),
        })
    }
}

impl TryFrom<String> for Object {
    type Error = Error;
    fn try_from(id: String) -> Result<Self, Self::Error> {
        Ok(match node_from_id(id)? {
            Ok(iri) => Object::IRIRef(iri),
            Err(label) => Object::BlankNodeLabel(label),
        })
    }
}

impl TryFrom<String> for GraphLabel {
    type Error = Error;
    fn try_from(id: String) -> Result<Self, Self::Error> {
        Ok(match node_from_id(id)? {
            Ok(iri) => GraphLabel::IRIRef(iri),
            Err(label) => GraphLabel::BlankNodeLabel(label),
        })
    }
}

impl From<&Statement> for String {
    fn from(statement: &Statement) -> String {
        String::from(&statement.subject)
            + " "
            + &String::from(&statement.predicate)
            + " "
            + &String::from(&statement.object)
            + &match &statement.graph_label {
                Some(graph_label) => " ".to_string() + &String::from(graph_label),
                None => "".to_string(),
            }
            + " .\n"
    }
}

impl From<&Subject> for String {
    fn from(subject: &Subject) -> String {
        match subject {
            Subject::IRIRef(iri_ref) => String::from(iri_ref),
            Subject::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
        }
    }
}

impl From<&Predicate> for String {
    fn from(predicate: &Predicate) -> String {
        match predicate {
            Predicate::IRIRef(iri_ref) => String::from(iri_ref),
        }
    }
}

impl From<&Object> for String {
    fn from(object: &Object) -> String {
        match object {
            Object::IRIRef(iri_ref) => String::from(iri_ref),
            Object::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
            Object::Literal(literal) => String::from(literal),
        }
    }
}

impl From<&GraphLabel> for String {
    fn from(graph_label: &GraphLabel) -> String {
        match graph_label {
            GraphLabel::IRIRef(iri_ref) => String::from(iri_ref),
            GraphLabel::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
        }
    }
}

impl From<&IRIRef> for String {
    fn from(iri_ref: &IRIRef) -> String {
        // IRIs are written as-is, matching the canonical form produced by
        // other URDNA2015 implementations.
        format!("<{}>", iri_ref.0)
    }
}

impl From<&StringLiteral> for String {
    fn from(string_literal: &StringLiteral) -> String {
        let string = &string_literal.0;
        // estimate size of escaped string
        let mut out = String::with_capacity(string.len() + 6);
        out.push('"');
        for c in string.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl From<&BlankNodeLabel> for String {
    fn from(blank_node_label: &BlankNodeLabel) -> String {
        blank_node_label.0.clone()
    }
}

impl From<&Literal> for String {
    fn from(literal: &Literal) -> String {
        match literal {
            Literal::String { string } => String::from(string),
            Literal::Typed { string, type_ } => String::from(string) + "^^" + &String::from(type_),
            Literal::LangTagged { string, lang } => String::from(string) + "@" + lang.as_str(),
        }
    }
}

impl Statement {
    pub fn blank_node_components(&self) -> Vec<&BlankNodeLabel> {
        self.blank_node_components_with_position()
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }

    /// Blank node labels of the statement with their position: `s`, `o` or `g`.
    pub fn blank_node_components_with_position(&self) -> Vec<(&BlankNodeLabel, char)> {
        let mut labels = Vec::new();
        if let Subject::BlankNodeLabel(ref label) = self.subject {
            labels.push((label, 's'));
        }
        if let Object::BlankNodeLabel(ref label) = self.object {
            labels.push((label, 'o'));
        }
        if let Some(GraphLabel::BlankNodeLabel(ref label)) = self.graph_label {
            labels.push((label, 'g'));
        }
        labels
    }

    pub fn blank_node_components_mut(&mut self) -> Vec<&mut BlankNodeLabel> {
        let mut labels = Vec::new();
        if let Subject::BlankNodeLabel(ref mut label) = self.subject {
            labels.push(label);
        }
        if let Object::BlankNodeLabel(ref mut label) = self.object {
            labels.push(label);
        }
        if let Some(GraphLabel::BlankNodeLabel(ref mut label)) = self.graph_label {
            labels.push(label);
        }
        labels
    }
}

impl DataSet {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn add_statement(&mut self, statement: Statement) {
        if !self.statements.contains(&statement) {
            self.statements.push(statement);
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn to_nquads(&self) -> Result<String, Error> {
        let mut lines = self
            .statements
            .iter()
            .map(|statement| statement.into())
            .collect::<Vec<String>>();
        lines.sort();
        Ok(lines.join(""))
    }
}

enum Term {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
    Literal(Literal),
}

struct TermReader<'a> {
    line: &'a str,
    rest: &'a str,
}

impl<'a> TermReader<'a> {
    fn error(&self) -> Error {
        Error::InvalidNQuad(self.line.to_string())
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn read_iri(&mut self) -> Result<IRIRef, Error> {
        let rest = self.rest;
        let end = rest.find('>').ok_or_else(|| self.error())?;
        let iri = rest[1..end].to_string();
        self.rest = &rest[end + 1..];
        Ok(IRIRef(iri))
    }

    fn read_string(&mut self) -> Result<StringLiteral, Error> {
        let rest = self.rest;
        let mut out = String::new();
        let mut chars = rest.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &rest[i + 1..];
                    return Ok(StringLiteral(out));
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'b')) => out.push('\x08'),
                    Some((_, 'f')) => out.push('\x0c'),
                    Some((_, '"')) => out.push('"'),
                    Some((_, '\'')) => out.push('\''),
                    Some((_, '\\')) => out.push('\\'),
                    Some((j, u @ 'u')) | Some((j, u @ 'U')) => {
                        let len = if u == 'u' { 4 } else { 8 };
                        let hex = rest.get(j + 1..j + 1 + len).ok_or_else(|| self.error())?;
                        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error())?;
                        out.push(std::char::from_u32(code).ok_or_else(|| self.error())?);
                        for _ in 0..len {
                            chars.next();
                        }
                    }
                    _ => return Err(self.error()),
                },
                c => out.push(c),
            }
        }
        Err(self.error())
    }

    fn read_word(&mut self) -> &'a str {
        let rest = self.rest;
        let end = rest.find(char::is_whitespace).unwrap_or_else(|| rest.len());
        self.rest = &rest[end..];
        &rest[..end]
    }

    fn read_term(&mut self) -> Result<Option<Term>, Error> {
        self.skip_whitespace();
        if self.rest.starts_with('<') {
            Ok(Some(Term::IRIRef(self.read_iri()?)))
        } else if self.rest.starts_with("_:") {
            Ok(Some(Term::BlankNodeLabel(BlankNodeLabel(
                self.read_word().to_string(),
            ))))
        } else if self.rest.starts_with('"') {
            let string = self.read_string()?;
            if self.rest.starts_with('@') {
                self.rest = &self.rest[1..];
                let lang = Lang::from_str(self.read_word())?;
                Ok(Some(Term::Literal(Literal::LangTagged { string, lang })))
            } else if self.rest.starts_with("^^") {
                self.rest = &self.rest[2..];
                let type_ = self.read_iri()?;
                if type_.0 == XSD_STRING {
                    Ok(Some(Term::Literal(Literal::String { string })))
                } else {
                    Ok(Some(Term::Literal(Literal::Typed { string, type_ })))
                }
            } else {
                Ok(Some(Term::Literal(Literal::String { string })))
            }
        } else {
            Ok(None)
        }
    }
}

impl FromStr for Statement {
    type Err = Error;
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut reader = TermReader { line, rest: line };
        let subject = match reader.read_term()? {
            Some(Term::IRIRef(iri)) => Subject::IRIRef(iri),
            Some(Term::BlankNodeLabel(label)) => Subject::BlankNodeLabel(label),
            _ => return Err(reader.error()),
        };
        let predicate = match reader.read_term()? {
            Some(Term::IRIRef(iri)) => Predicate::IRIRef(iri),
            _ => return Err(reader.error()),
        };
        let object = match reader.read_term()? {
            Some(Term::IRIRef(iri)) => Object::IRIRef(iri),
            Some(Term::BlankNodeLabel(label)) => Object::BlankNodeLabel(label),
            Some(Term::Literal(literal)) => Object::Literal(literal),
            None => return Err(reader.error()),
        };
        let graph_label = match reader.read_term()? {
            Some(Term::IRIRef(iri)) => Some(GraphLabel::IRIRef(iri)),
            Some(Term::BlankNodeLabel(label)) => Some(GraphLabel::BlankNodeLabel(label)),
            Some(Term::Literal(_)) => return Err(reader.error()),
            None => None,
        };
        reader.skip_whitespace();
        if reader.rest.trim_end() != "." {
            return Err(reader.error());
        }
        Ok(Statement {
            subject,
            predicate,
            object,
            graph_label,
        })
    }
}

impl FromStr for DataSet {
    type Err = Error;
    fn from_str(nquads: &str) -> Result<Self, Self::Err> {
        let mut dataset = DataSet::default();
        for line in nquads.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            dataset.add_statement(Statement::from_str(line)?);
        }
        Ok(dataset)
    }
}
