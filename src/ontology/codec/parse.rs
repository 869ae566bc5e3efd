use oxrdf::{Term, Triple};
use oxrdfxml::RdfXmlParser;
use oxttl::{n3::N3Term, N3Parser, NTriplesParser, TurtleParser};

use super::{ParseAttempt, RdfFormat};

/// Format independent view of an RDF term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        lang: Option<String>,
    },
}

impl Node {
    pub(crate) fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    fn from_term(term: Term) -> Option<Self> {
        #[allow(unreachable_patterns)]
        match term {
            Term::NamedNode(node) => Some(Self::Iri(node.into_string())),
            Term::BlankNode(node) => Some(Self::Blank(node.into_string())),
            Term::Literal(literal) => Some(Self::Literal {
                value: literal.value().to_string(),
                lang: literal.language().map(str::to_string),
            }),
            _ => None,
        }
    }

    fn from_n3(term: N3Term) -> Option<Self> {
        #[allow(unreachable_patterns)]
        match term {
            N3Term::NamedNode(node) => Some(Self::Iri(node.into_string())),
            N3Term::BlankNode(node) => Some(Self::Blank(node.into_string())),
            N3Term::Literal(literal) => Some(Self::Literal {
                value: literal.value().to_string(),
                lang: literal.language().map(str::to_string),
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Statement {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

impl Statement {
    fn from_triple(triple: Triple) -> Option<Self> {
        Some(Self {
            subject: Node::from_term(Term::from(triple.subject))?,
            predicate: triple.predicate.into_string(),
            object: Node::from_term(triple.object)?,
        })
    }
}

/// Statements of one parsed document plus the prefixes it declared.
#[derive(Clone, Debug, Default)]
pub(crate) struct Document {
    pub statements: Vec<Statement>,
    pub prefixes: Vec<(String, String)>,
}

impl Document {
    /// Namespace bound to `prefix`.
    pub(crate) fn namespace_of(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(candidate, _)| candidate == prefix)
            .map(|(_, namespace)| namespace.as_str())
    }

    /// Prefix bound to `namespace`.
    pub(crate) fn prefix_of(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, candidate)| candidate == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }
}

/// Parses `bytes` with the first format that accepts them.
///
/// Every failure is collected so the caller can report all attempts.
pub(crate) fn parse_any(
    bytes: &[u8],
    hint: Option<RdfFormat>,
) -> Result<(RdfFormat, Document), Vec<ParseAttempt>> {
    let mut attempts = Vec::new();
    for format in RdfFormat::attempt_order(hint) {
        match parse(bytes, format) {
            Ok(document) => return Ok((format, document)),
            Err(message) => {
                tracing::debug!(%format, %message, "rdf parse attempt failed");
                attempts.push(ParseAttempt { format, message });
            }
        }
    }
    Err(attempts)
}

fn parse(bytes: &[u8], format: RdfFormat) -> Result<Document, String> {
    match format {
        RdfFormat::Turtle => {
            let mut parser = TurtleParser::new().for_reader(bytes);
            let mut statements = Vec::new();
            for triple in parser.by_ref() {
                let triple = triple.map_err(|err| err.to_string())?;
                statements.extend(Statement::from_triple(triple));
            }
            let prefixes = parser
                .prefixes()
                .map(|(prefix, namespace)| (prefix.to_string(), namespace.to_string()))
                .collect();
            Ok(Document {
                statements,
                prefixes,
            })
        }
        RdfFormat::NTriples => {
            let mut statements = Vec::new();
            for triple in NTriplesParser::new().for_reader(bytes) {
                let triple = triple.map_err(|err| err.to_string())?;
                statements.extend(Statement::from_triple(triple));
            }
            Ok(Document {
                statements,
                prefixes: Vec::new(),
            })
        }
        RdfFormat::N3 => {
            let mut parser = N3Parser::new().for_reader(bytes);
            let mut statements = Vec::new();
            for quad in parser.by_ref() {
                let quad = quad.map_err(|err| err.to_string())?;
                let predicate = match quad.predicate {
                    N3Term::NamedNode(node) => node.into_string(),
                    _ => continue,
                };
                if let (Some(subject), Some(object)) =
                    (Node::from_n3(quad.subject), Node::from_n3(quad.object))
                {
                    statements.push(Statement {
                        subject,
                        predicate,
                        object,
                    });
                }
            }
            let prefixes = parser
                .prefixes()
                .map(|(prefix, namespace)| (prefix.to_string(), namespace.to_string()))
                .collect();
            Ok(Document {
                statements,
                prefixes,
            })
        }
        RdfFormat::RdfXml => {
            let mut statements = Vec::new();
            for triple in RdfXmlParser::new().for_reader(bytes) {
                let triple = triple.map_err(|err| err.to_string())?;
                statements.extend(Statement::from_triple(triple));
            }
            Ok(Document {
                statements,
                prefixes: Vec::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_any, Node};
    use crate::ontology::codec::RdfFormat;

    #[test]
    fn turtle_keeps_prefixes_and_language_tags() {
        let input = br#"
            @prefix ex: <http://example.com/ex/> .
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
            ex:Person rdfs:label "Person"@en .
        "#;
        let (format, document) = parse_any(input, None).expect("turtle");
        assert_eq!(format, RdfFormat::Turtle);
        assert_eq!(document.namespace_of("ex"), Some("http://example.com/ex/"));
        assert_eq!(document.prefix_of("http://example.com/ex/"), Some("ex"));
        assert_eq!(document.statements.len(), 1);
        assert_eq!(
            document.statements[0].object,
            Node::Literal {
                value: "Person".into(),
                lang: Some("en".into())
            }
        );
    }

    #[test]
    fn rdf_xml_is_reached_by_fallback() {
        let input = br#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#">
  <rdfs:Class rdf:about="http://example.com/ex/Person"/>
</rdf:RDF>"#;
        let (format, document) = parse_any(input, None).expect("rdf/xml");
        assert_eq!(format, RdfFormat::RdfXml);
        assert_eq!(
            document.statements[0].subject.as_iri(),
            Some("http://example.com/ex/Person")
        );
    }

    #[test]
    fn garbage_reports_every_attempt() {
        let attempts = parse_any(b"this is { not rdf", None).expect_err("garbage");
        let formats: Vec<_> = attempts.iter().map(|attempt| attempt.format).collect();
        assert_eq!(formats, RdfFormat::FALLBACK_ORDER.to_vec());
    }
}
