//! Encoded identifier parsing

/// Marker that starts a pointer into the document's `definitions`
pub const DEFINITIONS_MARKER: &str = "#/definitions/";

/// An encoded identifier taken from `$id` / `$ref`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedIdentifier {
    /// `tag_namespace_local`, e.g. `#assembly_oscal-ap_assessment-plan`
    Qualified { namespace: String, local: String },
    /// `#/definitions/<local>`
    Pointer { local: String },
    /// Anything else, including the empty string
    Raw { value: String },
}

impl ParsedIdentifier {
    pub fn parse(identifier: &str) -> Self {
        if let Some(local) = identifier.strip_prefix(DEFINITIONS_MARKER) {
            return ParsedIdentifier::Pointer {
                local: local.to_string(),
            };
        }

        let segments: Vec<&str> = identifier.split('_').collect();
        if let [_tag, namespace, local] = segments.as_slice() {
            return ParsedIdentifier::Qualified {
                namespace: namespace.to_string(),
                local: local.to_string(),
            };
        }

        ParsedIdentifier::Raw {
            value: identifier.to_string(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        matches!(self, ParsedIdentifier::Qualified { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified() {
        assert_eq!(
            ParsedIdentifier::parse("#assembly_oscal-ap_assessment-plan"),
            ParsedIdentifier::Qualified {
                namespace: "oscal-ap".to_string(),
                local: "assessment-plan".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_pointer_before_segments() {
        // Pointer marker wins even when the remainder has underscores
        assert_eq!(
            ParsedIdentifier::parse("#/definitions/a_b_c"),
            ParsedIdentifier::Pointer {
                local: "a_b_c".to_string()
            }
        );
    }

    #[test]
    fn test_parse_raw() {
        assert_eq!(
            ParsedIdentifier::parse("#json-schema-directive"),
            ParsedIdentifier::Raw {
                value: "#json-schema-directive".to_string()
            }
        );
        assert_eq!(
            ParsedIdentifier::parse(""),
            ParsedIdentifier::Raw { value: String::new() }
        );
        // Four segments is not the qualified form
        assert!(!ParsedIdentifier::parse("#a_b_c_d").is_qualified());
    }
}
