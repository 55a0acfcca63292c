//! Protocol-Buffer-like text emitter
//!
//! Records, fixed arrays and maps become `message`s, choices become a
//! `message` wrapping a `oneof`, enumerations become `enum`s. Primitive and
//! ArrayOf definitions have no proto counterpart and are written as comments
//! so the type table stays complete.

use chrono::{DateTime, Utc};

use super::Emitter;
use crate::error::Result;
use crate::ir::{BaseKind, CanonicalSchema, CanonicalType, Field, Primitive, StructField, TypeOption};

/// Width of the info key column
const INFO_WIDTH: usize = 12;

#[derive(Debug, Clone, Default)]
pub struct ProtoEmitter {
    /// Source named in the generation header; no header when unset
    source: Option<String>,
    /// Fixed header timestamp; `Utc::now()` when unset
    timestamp: Option<DateTime<Utc>>,
}

impl ProtoEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Emitter for ProtoEmitter {
    fn extension(&self) -> &'static str {
        "proto"
    }

    fn emit(&self, schema: &CanonicalSchema) -> Result<String> {
        let mut text = String::new();

        if let Some(source) = &self.source {
            let ts = self.timestamp.unwrap_or_else(Utc::now);
            text.push_str(&format!(
                "/* Generated from {}, {} */\n\n",
                source,
                ts.format("%a %b %e %H:%M:%S %Y")
            ));
        }

        text.push_str("syntax = \"proto3\";\n");

        let info = serde_json::to_value(&schema.info)?;
        if let Some(fields) = info.as_object() {
            for (key, value) in fields {
                if key == "package" {
                    text.push_str(&format!("package {};\n", uri_to_revid(&schema.info.package)));
                } else {
                    text.push_str(&format!("// {:>width$}: {}\n", key, value, width = INFO_WIDTH));
                }
            }
        }
        text.push('\n');

        for t in &schema.types {
            emit_type(&mut text, t);
        }

        Ok(text)
    }
}

/// Reversed-domain form of a package URI:
/// `http://csrc.nist.gov/ns/oscal/1.1.2/catalog` → `gov.nist.csrc.ns.oscal.1-1-2.catalog`
pub fn uri_to_revid(uri: &str) -> String {
    let Some((_, rest)) = uri.split_once("://") else {
        return uri.replace('/', ".");
    };
    let (netloc, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    let host = netloc.split(':').next().unwrap_or(netloc);

    let mut parts: Vec<String> = host.split('.').rev().map(str::to_string).collect();
    let path = path.replace('.', "-");
    parts.extend(path.split('/').skip(1).map(str::to_string));
    parts.join(".")
}

/// Proto identifier for a type name: `$` dropped, other separators become `_`
pub fn proto_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '$')
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_start_matches('_')
        .to_string()
}

fn field_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_start_matches('_')
        .to_string()
}

fn scalar(type_ref: &str) -> String {
    match Primitive::from_name(type_ref) {
        Some(Primitive::String) => "string".to_string(),
        Some(Primitive::Integer) => "int64".to_string(),
        Some(Primitive::Number) => "double".to_string(),
        Some(Primitive::Boolean) => "bool".to_string(),
        Some(Primitive::Binary) => "bytes".to_string(),
        None => proto_name(type_ref),
    }
}

fn label(field: &StructField) -> &'static str {
    let max = field.options.iter().find_map(|o| match o {
        TypeOption::MaxCount(n) => Some(*n),
        _ => None,
    });
    let min = field.options.iter().find_map(|o| match o {
        TypeOption::MinCount(n) => Some(*n),
        _ => None,
    });
    match (min, max) {
        (_, Some(n)) if n != 1 => "repeated ",
        (Some(0), _) => "optional ",
        _ => "",
    }
}

fn options_comment(t: &CanonicalType) -> String {
    let opts = t.option_strings();
    if opts.is_empty() {
        String::new()
    } else {
        format!(" {}", opts.join(" "))
    }
}

fn push_description(text: &mut String, indent: &str, desc: &str) {
    if !desc.is_empty() {
        text.push_str(&format!("{}// {}\n", indent, desc));
    }
}

fn emit_type(text: &mut String, t: &CanonicalType) {
    push_description(text, "", &t.description);
    let name = proto_name(&t.name);

    match t.base_kind {
        BaseKind::Record | BaseKind::Array => {
            text.push_str(&format!("message {} {{  // ${}{}\n", name, t.base_kind, options_comment(t)));
            for field in t.fields.iter().filter_map(Field::as_struct) {
                push_description(text, "  ", &field.description);
                text.push_str(&format!(
                    "  {}{} {} = {};\n",
                    label(field),
                    scalar(&field.type_ref),
                    field_name(&field.name),
                    field.id
                ));
            }
            text.push_str("}\n\n");
        }
        BaseKind::MapOf => {
            let key = t.options.iter().find_map(|o| match o {
                TypeOption::KeyType(k) => Some(scalar(k)),
                _ => None,
            });
            let value = t.options.iter().find_map(|o| match o {
                TypeOption::ValueType(v) => Some(scalar(v)),
                _ => None,
            });
            text.push_str(&format!("message {} {{  // ${}{}\n", name, t.base_kind, options_comment(t)));
            text.push_str(&format!(
                "  map<{}, {}> entries = 1;\n",
                key.unwrap_or_else(|| "string".to_string()),
                value.unwrap_or_else(|| "string".to_string())
            ));
            text.push_str("}\n\n");
        }
        BaseKind::Choice(_) => {
            text.push_str(&format!("message {} {{  // ${}{}\n", name, t.base_kind, options_comment(t)));
            text.push_str(&format!("  oneof {} {{\n", field_name(&name).to_lowercase()));
            for field in t.fields.iter().filter_map(Field::as_struct) {
                push_description(text, "    ", &field.description);
                text.push_str(&format!(
                    "    {} {} = {};\n",
                    scalar(&field.type_ref),
                    field_name(&field.name),
                    field.id
                ));
            }
            text.push_str("  }\n}\n\n");
        }
        BaseKind::Enumerated => {
            text.push_str(&format!("enum {} {{  // ${}{}\n", name, t.base_kind, options_comment(t)));
            let enum_prefix = field_name(&name).to_uppercase();
            text.push_str(&format!("  {}_UNSPECIFIED = 0;\n", enum_prefix));
            for field in &t.fields {
                if let Field::Item(item) = field {
                    push_description(text, "  ", &item.description);
                    text.push_str(&format!(
                        "  {}_{} = {};\n",
                        enum_prefix,
                        field_name(&item.value).to_uppercase(),
                        item.id
                    ));
                }
            }
            text.push_str("}\n\n");
        }
        BaseKind::ArrayOf | BaseKind::Primitive(_) => {
            text.push_str(&format!("// ${}({}){}\n\n", name, t.base_kind, options_comment(t)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{make_type, ChoiceDiscipline, PackageInfo};
    use chrono::TimeZone;

    #[test]
    fn test_uri_to_revid() {
        assert_eq!(
            uri_to_revid("http://csrc.nist.gov/ns/oscal/1.1.2/oscal-catalog"),
            "gov.nist.csrc.ns.oscal.1-1-2.oscal-catalog"
        );
        assert_eq!(uri_to_revid("https://example.org:8080/a/b"), "org.example.a.b");
        assert_eq!(uri_to_revid("local/pkg"), "local.pkg");
    }

    #[test]
    fn test_proto_name() {
        assert_eq!(proto_name("n01:Catalog.groups"), "n01_Catalog_groups");
        assert_eq!(proto_name("$Root"), "Root");
        assert_eq!(proto_name("n01:$Root"), "n01_Root");
    }

    #[test]
    fn test_emit_message_enum_oneof() {
        let mut info = PackageInfo::new("http://example.org/ns/shapes");
        info.title = Some("Shapes".to_string());
        let schema = CanonicalSchema {
            info,
            types: vec![
                make_type(
                    "Drawing",
                    BaseKind::Record,
                    vec![],
                    "A drawing",
                    vec![
                        Field::structured(1, "title", "String", vec![], ""),
                        Field::structured(2, "shapes", "Shape", vec![TypeOption::MinCount(0), TypeOption::MaxCount(0)], ""),
                        Field::structured(3, "last-modified", "String", vec![TypeOption::MinCount(0), TypeOption::MaxCount(1)], ""),
                    ],
                ),
                make_type(
                    "Shape",
                    BaseKind::Choice(ChoiceDiscipline::ExactlyOne),
                    vec![],
                    "",
                    vec![
                        Field::structured(1, "c1", "Circle", vec![], ""),
                        Field::structured(2, "c2", "Kind", vec![], ""),
                    ],
                ),
                make_type(
                    "Kind",
                    BaseKind::Enumerated,
                    vec![],
                    "",
                    vec![Field::item(1, "square", ""), Field::item(2, "triangle", "")],
                ),
                make_type("Circle", BaseKind::Primitive(Primitive::Number), vec![TypeOption::MinValue(0)], "", vec![]),
            ],
        };

        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let text = ProtoEmitter::new()
            .with_source("shapes.json")
            .with_timestamp(ts)
            .emit(&schema)
            .unwrap();

        assert!(text.starts_with("/* Generated from shapes.json, Fri Mar  1 12:00:00 2024 */"));
        assert!(text.contains("syntax = \"proto3\";\npackage org.example.ns.shapes;\n"));
        assert!(text.contains("//        title: \"Shapes\"\n"));
        assert!(text.contains("// A drawing\nmessage Drawing {  // $Record\n"));
        assert!(text.contains("  repeated Shape shapes = 2;\n"));
        assert!(text.contains("  optional string last_modified = 3;\n"));
        assert!(text.contains("message Shape {  // $Choice CX\n  oneof shape {\n    Circle c1 = 1;\n"));
        assert!(text.contains("enum Kind {  // $Enumerated\n  KIND_UNSPECIFIED = 0;\n  KIND_SQUARE = 1;\n"));
        assert!(text.contains("// $Circle(Number) {0\n"));
    }
}
