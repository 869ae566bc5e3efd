use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value object ensuring that supplied text represents a valid absolute IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

/// Splits `iri` into `(namespace, local_name)` at the last `#`, `/` or `:`.
///
/// The namespace keeps its trailing separator so that
/// `namespace + local_name == iri` always holds.
#[must_use]
pub fn split_namespace(iri: &str) -> (&str, &str) {
    match iri.rfind(['#', '/', ':']) {
        Some(index) => iri.split_at(index + 1),
        None => ("", iri),
    }
}

/// Identity of an ontology inside a document arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OntologyId(pub(crate) u64);

/// Identity of a resource inside a document arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub(crate) u64);

macro_rules! identity {
    ($name:ident) => {
        impl $name {
            /// Returns the raw wire identity.
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identity!(OntologyId);
identity!(ResourceId);

/// A node addressable by identity: either an ontology container or a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Ontology(OntologyId),
    Resource(ResourceId),
}

impl NodeRef {
    #[must_use]
    pub fn identity(self) -> u64 {
        match self {
            Self::Ontology(id) => id.get(),
            Self::Resource(id) => id.get(),
        }
    }

    #[must_use]
    pub fn as_resource(self) -> Option<ResourceId> {
        match self {
            Self::Resource(id) => Some(id),
            Self::Ontology(_) => None,
        }
    }

    #[must_use]
    pub fn as_ontology(self) -> Option<OntologyId> {
        match self {
            Self::Ontology(id) => Some(id),
            Self::Resource(_) => None,
        }
    }
}

impl From<OntologyId> for NodeRef {
    fn from(value: OntologyId) -> Self {
        Self::Ontology(value)
    }
}

impl From<ResourceId> for NodeRef {
    fn from(value: ResourceId) -> Self {
        Self::Resource(value)
    }
}

/// The five kinds of graph nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Class,
    Property,
    Datatype,
    Instance,
    Literal,
}

impl ResourceKind {
    /// Returns the root list a resource of this kind is attached to, if any.
    #[must_use]
    pub fn root_list(self) -> Option<RootList> {
        match self {
            Self::Class | Self::Datatype => Some(RootList::Classes),
            Self::Property => Some(RootList::Properties),
            Self::Instance | Self::Literal => None,
        }
    }

    /// Classes and datatypes share the class hierarchy and views.
    #[must_use]
    pub fn is_class_like(self) -> bool {
        matches!(self, Self::Class | Self::Datatype)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Class => "Class",
            Self::Property => "Property",
            Self::Datatype => "Datatype",
            Self::Instance => "Instance",
            Self::Literal => "Literal",
        };
        f.write_str(name)
    }
}

/// Selects one of the two root lists of an ontology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RootList {
    Classes,
    Properties,
}

/// Language tagged text: language tag (possibly empty) to value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangString(BTreeMap<String, String>);

impl LangString {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a [`LangString`] holding a single entry.
    #[must_use]
    pub fn single(lang: impl Into<String>, value: impl Into<String>) -> Self {
        let mut text = Self::new();
        text.set(lang, value);
        text
    }

    /// Sets the value for `lang`, replacing a previous one.
    pub fn set(&mut self, lang: impl Into<String>, value: impl Into<String>) {
        self.0.insert(lang.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn remove(&mut self, lang: &str) -> Option<String> {
        self.0.remove(lang)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(lang, value)| (lang.as_str(), value.as_str()))
    }

    /// The longest non-blank value, rendered `"value"@lang` when tagged.
    #[must_use]
    pub fn best(&self) -> Option<String> {
        let (lang, value) = self
            .0
            .iter()
            .max_by_key(|(_, value)| value.chars().count())?;
        if value.trim().is_empty() {
            return None;
        }
        if lang.is_empty() {
            Some(value.clone())
        } else {
            Some(format!("\"{value}\"@{lang}"))
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LangString {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(lang, value)| (lang.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{split_namespace, Iri, LangString, ResourceKind, RootList};

    #[test]
    fn accepts_valid_iri() {
        let iri = Iri::new("https://example.org/resource").expect("valid IRI");
        assert_eq!(iri.as_str(), "https://example.org/resource");
        let parsed: Iri = "https://example.org/resource".parse().expect("parsed IRI");
        assert_eq!(parsed, iri);
    }

    #[test]
    fn rejects_invalid_iri() {
        let err = Iri::new("not an iri").expect_err("invalid IRI");
        assert!(matches!(err, super::IriError::Invalid { value } if value == "not an iri"));
    }

    #[rstest]
    #[case("http://xmlns.com/foaf/0.1/Person", "http://xmlns.com/foaf/0.1/", "Person")]
    #[case("http://www.w3.org/2001/XMLSchema#string", "http://www.w3.org/2001/XMLSchema#", "string")]
    #[case("urn:isbn", "urn:", "isbn")]
    #[case("plain", "", "plain")]
    fn splits_namespace(#[case] iri: &str, #[case] namespace: &str, #[case] local: &str) {
        assert_eq!(split_namespace(iri), (namespace, local));
    }

    #[test]
    fn best_label_prefers_longest_value() {
        let label: LangString = [("en", "Car"), ("de", "Kraftfahrzeug")].into_iter().collect();
        assert_eq!(label.best().as_deref(), Some("\"Kraftfahrzeug\"@de"));

        let untagged = LangString::single("", "Vehicle");
        assert_eq!(untagged.best().as_deref(), Some("Vehicle"));

        let blank = LangString::single("en", "   ");
        assert_eq!(blank.best(), None);
    }

    #[test]
    fn kinds_map_to_root_lists() {
        assert_eq!(ResourceKind::Class.root_list(), Some(RootList::Classes));
        assert_eq!(ResourceKind::Datatype.root_list(), Some(RootList::Classes));
        assert_eq!(ResourceKind::Property.root_list(), Some(RootList::Properties));
        assert_eq!(ResourceKind::Instance.root_list(), None);
    }
}
