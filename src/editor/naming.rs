//! Conversions between human labels and local names.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use crate::ontology::ResourceKind;

/// Turns a label into a local name: `UpperCamelCase` for classes,
/// `lowerCamelCase` for everything else, percent encoded.
///
/// ```
/// use rdfs_studio::editor::naming::label_to_local_name;
/// use rdfs_studio::ontology::ResourceKind;
///
/// assert_eq!(label_to_local_name(" motor vehicle ", ResourceKind::Class), "MotorVehicle");
/// assert_eq!(label_to_local_name("has part", ResourceKind::Property), "hasPart");
/// ```
#[must_use]
pub fn label_to_local_name(label: &str, kind: ResourceKind) -> String {
    let label = label.trim();
    let camel = match kind {
        ResourceKind::Class => label.to_upper_camel_case(),
        _ => label.to_lower_camel_case(),
    };
    urlencoding::encode(&camel).into_owned()
}

/// Turns a local name back into a label: percent decoding, then splitting
/// camel case words.
///
/// ```
/// use rdfs_studio::editor::naming::local_name_to_label;
///
/// assert_eq!(local_name_to_label("hasPart"), "has Part");
/// assert_eq!(local_name_to_label("HTTPServer"), "HTTP Server");
/// ```
#[must_use]
pub fn local_name_to_label(local_name: &str) -> String {
    let local_name = local_name.trim();
    match urlencoding::decode(local_name) {
        Ok(decoded) => split_camel_case(&decoded),
        Err(_) => split_camel_case(local_name),
    }
}

fn split_camel_case(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let after_lower = !chars[i - 1].is_uppercase();
            let starts_word = chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if after_lower || starts_word {
                out.push(' ');
            }
        }
        out.push(*c);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
