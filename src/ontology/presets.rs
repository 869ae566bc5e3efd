//! Well known vocabularies bundled with the binary.

use super::codec::{guess_from_file_name, RdfFormat};

/// A bundled Turtle vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preset {
    /// Name used on the wire and as the prefix of the imported ontology.
    pub name: &'static str,
    pub title: &'static str,
    pub turtle: &'static str,
}

impl Preset {
    #[must_use]
    pub fn format(&self) -> RdfFormat {
        RdfFormat::Turtle
    }
}

pub const XSD: Preset = Preset {
    name: "xsd",
    title: "XML Schema Datatypes",
    turtle: include_str!("../../vocab/xsd.ttl"),
};

pub const RDFS: Preset = Preset {
    name: "rdfs",
    title: "RDF Schema",
    turtle: include_str!("../../vocab/rdfs.ttl"),
};

pub const FOAF: Preset = Preset {
    name: "foaf",
    title: "Friend of a Friend",
    turtle: include_str!("../../vocab/foaf.ttl"),
};

pub const DCT: Preset = Preset {
    name: "dct",
    title: "DCMI Metadata Terms",
    turtle: include_str!("../../vocab/dct.ttl"),
};

pub const ALL: [Preset; 4] = [XSD, RDFS, FOAF, DCT];

/// Looks a preset up by name. Resource style names such as
/// `/vocab/foaf.ttl` resolve by their file stem.
#[must_use]
pub fn find(name: &str) -> Option<Preset> {
    let (stem, _) = guess_from_file_name(name.trim());
    ALL.into_iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(&stem))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::find;

    #[rstest]
    #[case("foaf", Some("foaf"))]
    #[case("/vocab/xsd.ttl", Some("xsd"))]
    #[case("DCT", Some("dct"))]
    #[case("schema", None)]
    fn presets_resolve_by_name(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(find(name).map(|preset| preset.name), expected);
    }

    #[test]
    fn bundled_vocabularies_are_not_empty() {
        for preset in super::ALL {
            assert!(preset.turtle.contains("@prefix"), "{}", preset.name);
        }
    }
}
