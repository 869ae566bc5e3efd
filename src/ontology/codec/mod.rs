//! RDF codec: reads Turtle, N-Triples, N3 or RDF/XML into the document
//! arena and writes an ontology back as Turtle.

mod load;
mod parse;
mod turtle;

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use thiserror::Error;

use super::graph::GraphError;

pub use load::{load_graph, LoadOptions};
pub use turtle::to_turtle;

/// Serialization formats accepted on load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RdfFormat {
    Turtle,
    NTriples,
    N3,
    RdfXml,
}

impl RdfFormat {
    /// Formats in the order they are attempted when no hint is given.
    pub const FALLBACK_ORDER: [Self; 4] = [Self::Turtle, Self::NTriples, Self::N3, Self::RdfXml];

    /// Guesses a format from a file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ttl" | "turtle" => Some(Self::Turtle),
            "nt" | "ntriples" => Some(Self::NTriples),
            "n3" => Some(Self::N3),
            "rdf" | "xml" | "owl" | "rdfs" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// The order formats are tried in: the hint first, then the fallback order.
    #[must_use]
    pub fn attempt_order(hint: Option<Self>) -> Vec<Self> {
        let mut order = Vec::with_capacity(Self::FALLBACK_ORDER.len());
        order.extend(hint);
        order.extend(
            Self::FALLBACK_ORDER
                .into_iter()
                .filter(|format| Some(*format) != hint),
        );
        order
    }
}

impl Display for RdfFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Turtle => "Turtle",
            Self::NTriples => "N-Triples",
            Self::N3 => "N3",
            Self::RdfXml => "RDF/XML",
        };
        f.write_str(name)
    }
}

/// One failed parse attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAttempt {
    pub format: RdfFormat,
    pub message: String,
}

fn describe(attempts: &[ParseAttempt]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.format, attempt.message))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// No format could parse the input; nothing was applied.
    #[error("no supported RDF format could parse the input\n\n{}", describe(.attempts))]
    Unparsable { attempts: Vec<ParseAttempt> },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("cannot write `{term}`: {message}")]
    InvalidTerm { term: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unknown vocabulary preset `{0}`")]
    UnknownPreset(String),
}

/// Guesses the ontology prefix and format from an uploaded file name:
/// `foaf.ttl` gives `("foaf", Some(Turtle))`.
#[must_use]
pub fn guess_from_file_name(file_name: &str) -> (String, Option<RdfFormat>) {
    let path = Path::new(file_name);
    let prefix = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = path
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(RdfFormat::from_extension);
    (prefix, format)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{guess_from_file_name, RdfFormat};

    #[test]
    fn hint_is_tried_first() {
        assert_eq!(
            RdfFormat::attempt_order(Some(RdfFormat::RdfXml)),
            vec![
                RdfFormat::RdfXml,
                RdfFormat::Turtle,
                RdfFormat::NTriples,
                RdfFormat::N3
            ]
        );
        assert_eq!(RdfFormat::attempt_order(None), RdfFormat::FALLBACK_ORDER.to_vec());
    }

    #[rstest]
    #[case("foaf.ttl", "foaf", Some(RdfFormat::Turtle))]
    #[case("/tmp/upload/people.rdf", "people", Some(RdfFormat::RdfXml))]
    #[case("dump.nt", "dump", Some(RdfFormat::NTriples))]
    #[case("vocabulary", "vocabulary", None)]
    fn file_names_give_prefix_and_format(
        #[case] file_name: &str,
        #[case] prefix: &str,
        #[case] format: Option<RdfFormat>,
    ) {
        assert_eq!(guess_from_file_name(file_name), (prefix.to_string(), format));
    }
}
