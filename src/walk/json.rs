//! JSON Schema front-end
//!
//! Walks `definitions` of a Metaschema-generated JSON Schema and emits one
//! canonical type per named or structured anonymous node.

use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};

use crate::config::NamingConfig;
use crate::error::{Result, TranslateError};
use crate::ir::{
    make_type, BaseKind, CanonicalSchema, ChoiceDiscipline, Field, PackageInfo, Primitive, TypeOption, TypeRef,
};
use crate::resolve::NamespaceRegistry;

use super::{package_base, Translation, TranslationSession};

const PACKAGE_SUFFIX: &str = "-schema.json";

/// Translate one JSON Schema document
pub fn translate(doc: &Value, naming: &NamingConfig, registry: &mut NamespaceRegistry) -> Result<Translation> {
    let root = doc
        .as_object()
        .ok_or_else(|| TranslateError::InvalidDocument("top level is not an object".to_string()))?;
    let id = root
        .get("$id")
        .and_then(Value::as_str)
        .ok_or_else(|| TranslateError::InvalidDocument("missing $id".to_string()))?;

    let empty = Map::new();
    let definitions = match root.get("definitions") {
        Some(Value::Object(defs)) => defs,
        Some(_) => return Err(TranslateError::InvalidDocument("definitions is not an object".to_string())),
        None => &empty,
    };

    let mut walker = JsonWalker {
        session: TranslationSession::new(naming, registry)?,
        definitions,
        definition_refs: HashMap::new(),
    };
    for (key, def) in definitions {
        let def_id = def.get("$id").and_then(Value::as_str);
        walker.session.resolver.add_definition(key, def_id);
    }

    for key in definitions.keys() {
        walker.scan_definition(key)?;
    }

    let mut info = PackageInfo::new(id.strip_suffix(PACKAGE_SUFFIX).unwrap_or(id));
    let text = |k: &str| root.get(k).and_then(Value::as_str).map(str::to_string);
    info.title = text("title");
    info.description = text("description");
    info.comment = text("$comment");
    info.version = text("version");
    info.copyright = text("copyright");
    info.license = text("license");

    if let Some(marker) = walker.scan_root(root)? {
        info.roots.push(marker);
    }

    let mut session = walker.session;
    session.check_names()?;
    info.namespaces = session.namespaces(&package_base(&info.package));
    info.config = session.naming.info_config();
    session.log_summary(&info.package);

    Ok(Translation {
        schema: CanonicalSchema {
            info,
            types: session.table.into_vec(),
        },
        diagnostics: session.diagnostics,
        stats: session.stats,
    })
}

struct JsonWalker<'a> {
    session: TranslationSession<'a>,
    definitions: &'a Map<String, Value>,
    /// definition key -> what scanning it produced
    definition_refs: HashMap<String, TypeRef>,
}

impl<'a> JsonWalker<'a> {
    /// Scan a top-level definition at most once
    fn scan_definition(&mut self, key: &str) -> Result<Option<TypeRef>> {
        if let Some(done) = self.definition_refs.get(key) {
            return Ok(Some(done.clone()));
        }
        if !self.session.seen.insert(key.to_string()) {
            // In progress further up the stack
            return Ok(None);
        }
        let Some(def) = self.definitions.get(key) else {
            return Ok(None);
        };
        let type_ref = self.scan(key, def, &[], "")?;
        self.definition_refs.insert(key.to_string(), type_ref.clone());
        Ok(Some(type_ref))
    }

    /// Synthetic root marker for documents with top-level `properties` or a
    /// `oneOf` of root objects
    fn scan_root(&mut self, root: &Map<String, Value>) -> Result<Option<TypeRef>> {
        if root.contains_key("properties") {
            let fields = self.scan_properties("", root, &[], "")?;
            return self.add_root_marker(BaseKind::Record, fields);
        }

        let Some(Value::Array(branches)) = root.get("oneOf") else {
            return Ok(None);
        };
        let mut fields = Vec::new();
        for branch in branches {
            let Some(obj) = branch.as_object() else { continue };
            let Some(root_name) = first_required(obj) else { continue };
            let Some(prop) = obj.get("properties").and_then(|p| p.get(root_name)) else {
                continue;
            };
            let type_ref = self.scan("", prop, &[root_name.to_string()], "")?;
            let id = fields.len() as u32 + 1;
            fields.push(Field::structured(id, root_name, type_ref, vec![], description(prop)));
        }
        self.add_root_marker(BaseKind::Choice(ChoiceDiscipline::ExactlyOne), fields)
    }

    fn add_root_marker(&mut self, kind: BaseKind, fields: Vec<Field>) -> Result<Option<TypeRef>> {
        let owner = fields
            .iter()
            .filter_map(Field::as_struct)
            .map(|f| f.type_ref.clone())
            .find(|t| t.contains(':'));
        let Some(owner) = owner else {
            return Ok(None);
        };
        let name = self.session.root_marker_for(&owner);
        let marker = make_type(name, kind, vec![], "", fields);
        Ok(Some(self.session.add(marker)?))
    }

    fn scan(&mut self, hint: &str, def: &Value, path: &[String], enclosing: &str) -> Result<TypeRef> {
        let obj = def
            .as_object()
            .ok_or_else(|| TranslateError::unsupported(self.path_str(hint, path), "definition is not an object"))?;
        let id = obj.get("$id").and_then(Value::as_str);
        let reference = obj.get("$ref").and_then(Value::as_str);
        if let Some(id) = id {
            self.session.stats.ids.insert(id.to_string());
        }
        if let Some(reference) = reference {
            self.session.stats.refs.insert(reference.to_string());
        }

        // Reference without its own $id: direct substitution
        if let (Some(reference), None) = (reference, id) {
            return self.scan_reference(hint, reference);
        }

        let mut enclosing = enclosing.to_string();
        let mut path = path.to_vec();
        if let Some(key) = id {
            if key != enclosing {
                enclosing = key.to_string();
                path.clear();
            }
        }

        let name = self
            .session
            .resolver
            .resolve(self.session.registry, hint, &enclosing, &path)?;
        let desc = description(def);

        // Reference with its own $id: an alias
        if let Some(reference) = reference {
            let target = self.scan_reference(hint, reference)?;
            let existed = self.session.table.contains(&name);
            let alias = make_type(
                name.clone(),
                BaseKind::Choice(ChoiceDiscipline::ExactlyOne),
                vec![],
                desc,
                vec![Field::structured(1, "alias", target.clone(), vec![], "")],
            );
            let name = self.session.add(alias)?;
            if !existed {
                tracing::debug!("alias {} -> {}", name, target);
                self.session.stats.aliases.insert(name.clone());
                self.session.diagnostics.alias(&name, &target);
            }
            return Ok(name);
        }

        let type_str = obj.get("type").and_then(Value::as_str);

        // Object
        if type_str == Some("object") || obj.contains_key("properties") {
            if !obj.contains_key("properties") {
                if let Some(values @ Value::Object(_)) = obj.get("additionalProperties") {
                    let mut vpath = path.clone();
                    vpath.push("value".to_string());
                    let value_type = self.scan(hint, values, &vpath, &enclosing)?;
                    let map = make_type(
                        name,
                        BaseKind::MapOf,
                        vec![
                            TypeOption::KeyType(Primitive::String.as_str().to_string()),
                            TypeOption::ValueType(value_type),
                        ],
                        desc,
                        vec![],
                    );
                    return self.session.add(map);
                }
            }
            let fields = self.scan_properties(hint, obj, &path, &enclosing)?;
            return self.session.add(make_type(name, BaseKind::Record, vec![], desc, fields));
        }

        // Homogeneous array
        if let Some(items @ Value::Object(item_obj)) = obj.get("items") {
            if item_obj.contains_key("$ref") {
                return self.scan(hint, items, &path, &enclosing);
            }
            let mut ipath = path.clone();
            ipath.push(self.session.naming.items_segment.clone());
            let item_type = self.scan(hint, items, &ipath, &enclosing)?;
            let mut opts = vec![TypeOption::ValueType(item_type)];
            if let Some(n) = positive(obj, "minItems") {
                opts.push(TypeOption::MinValue(n as i64));
            }
            if let Some(n) = positive(obj, "maxItems") {
                opts.push(TypeOption::MaxValue(n as i64));
            }
            return self.session.add(make_type(name, BaseKind::ArrayOf, opts, desc, vec![]));
        }

        // Positional array
        let positions = match (obj.get("prefixItems"), obj.get("items")) {
            (Some(Value::Array(p)), _) | (None, Some(Value::Array(p))) => Some(p),
            _ => None,
        };
        if let Some(positions) = positions {
            let mut fields = Vec::with_capacity(positions.len());
            for (n, item) in positions.iter().enumerate() {
                let field_name = format!("p{}", n + 1);
                let mut ppath = path.clone();
                ppath.push(field_name.clone());
                let item_type = self.scan(hint, item, &ppath, &enclosing)?;
                fields.push(Field::structured(n as u32 + 1, field_name, item_type, vec![], description(item)));
            }
            return self.session.add(make_type(name, BaseKind::Array, vec![], desc, fields));
        }

        // Enumeration
        if let Some(Value::Array(values)) = obj.get("enum") {
            let fields = values
                .iter()
                .enumerate()
                .map(|(n, v)| Field::item(n as u32 + 1, literal(v), ""))
                .collect();
            return self.session.add(make_type(name, BaseKind::Enumerated, vec![], desc, fields));
        }

        // Union
        if let Some((keyword, discipline)) = ["anyOf", "allOf", "oneOf"]
            .iter()
            .find_map(|k| ChoiceDiscipline::from_keyword(k).filter(|_| obj.contains_key(*k)).map(|d| (*k, d)))
        {
            let Some(Value::Array(branches)) = obj.get(keyword) else {
                return Err(TranslateError::unsupported(self.path_str(hint, &path), format!("{} is not a list", keyword)));
            };
            let mut fields = Vec::with_capacity(branches.len());
            for (n, branch) in branches.iter().enumerate() {
                let mut bpath = path.clone();
                bpath.push((n + 1).to_string());
                let branch_type = self.scan(hint, branch, &bpath, &enclosing)?;
                fields.push(Field::structured(
                    n as u32 + 1,
                    format!("c{}", n + 1),
                    branch_type,
                    vec![],
                    description(branch),
                ));
            }
            return self.session.add(make_type(name, BaseKind::Choice(discipline), vec![], desc, fields));
        }

        // Primitive
        if let Some(primitive) = type_str.and_then(Primitive::from_json_type) {
            let opts = primitive_options(primitive, obj, &self.path_str(hint, &path))?;
            if !path.is_empty() && opts.is_empty() {
                return Ok(primitive.as_str().to_string());
            }
            return self
                .session
                .add(make_type(name, BaseKind::Primitive(primitive), opts, desc, vec![]));
        }

        Err(TranslateError::unsupported(
            self.path_str(hint, &path),
            format!("unrecognized node shape (type {:?})", type_str),
        ))
    }

    /// Scan the target of a `$ref`. Targets in this document are scanned at
    /// most once and the result of that scan is what the reference means.
    fn scan_reference(&mut self, hint: &str, reference: &str) -> Result<TypeRef> {
        let key = self.session.resolver.definition_key(reference).map(str::to_string);
        if let Some(key) = key {
            if let Some(target) = self.scan_definition(&key)? {
                return Ok(target);
            }
        }
        self.session
            .resolver
            .resolve(self.session.registry, hint, reference, &[])
    }

    /// Record fields from `properties`, with occurrence options
    fn scan_properties(
        &mut self,
        hint: &str,
        obj: &Map<String, Value>,
        path: &[String],
        enclosing: &str,
    ) -> Result<Vec<Field>> {
        let required: HashSet<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let Some(Value::Object(properties)) = obj.get("properties") else {
            return Ok(Vec::new());
        };

        let mut fields = Vec::with_capacity(properties.len());
        for (n, (prop_name, prop)) in properties.iter().enumerate() {
            let mut fpath = path.to_vec();
            fpath.push(prop_name.clone());
            let is_required = required.contains(prop_name.as_str());
            let (field_type, opts) = self.scan_field(hint, prop, &fpath, enclosing, is_required)?;
            fields.push(Field::structured(n as u32 + 1, prop_name, field_type, opts, description(prop)));
        }
        Ok(fields)
    }

    /// A property's type and options. Array properties carry their
    /// array-ness in the count options and take the item type.
    fn scan_field(
        &mut self,
        hint: &str,
        prop: &Value,
        path: &[String],
        enclosing: &str,
        required: bool,
    ) -> Result<(TypeRef, Vec<TypeOption>)> {
        let mut opts = Vec::new();
        if !required {
            opts.push(TypeOption::MinCount(0));
        }

        let is_array = prop.get("type").and_then(Value::as_str) == Some("array");
        if let (true, Some(obj)) = (is_array, prop.as_object()) {
            let min_items = positive(obj, "minItems").unwrap_or(0);
            if required && min_items > 1 {
                opts.push(TypeOption::MinCount(min_items));
            }
            opts.push(TypeOption::MaxCount(positive(obj, "maxItems").unwrap_or(0)));

            let no_identity = !obj.contains_key("$id") && !obj.contains_key("$ref");
            if let (true, Some(items @ Value::Object(_))) = (no_identity, obj.get("items")) {
                let item_type = self.scan(hint, items, path, enclosing)?;
                return Ok((item_type, opts));
            }
        }

        Ok((self.scan(hint, prop, path, enclosing)?, opts))
    }

    fn path_str(&self, hint: &str, path: &[String]) -> String {
        let sys = self.session.naming.sys.as_str();
        if path.is_empty() {
            hint.to_string()
        } else {
            format!("{}{}{}", hint, sys, path.join(sys))
        }
    }
}

fn description(def: &Value) -> String {
    def.get("description")
        .or_else(|| def.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn positive(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(Value::as_u64).filter(|n| *n > 0)
}

fn literal(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn first_required(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("required")?.as_array()?.first()?.as_str()
}

fn primitive_options(primitive: Primitive, obj: &Map<String, Value>, path: &str) -> Result<Vec<TypeOption>> {
    let mut opts = Vec::new();
    match primitive {
        Primitive::String => {
            if let Some(format) = obj.get("format").and_then(Value::as_str) {
                opts.push(TypeOption::Format(format.to_string()));
            }
            if let Some(pattern) = obj.get("pattern").and_then(Value::as_str) {
                opts.push(TypeOption::Pattern(pattern.to_string()));
            }
            if let Some(n) = length(obj, "minLength", path)? {
                opts.push(TypeOption::MinValue(n));
            }
            if let Some(n) = length(obj, "maxLength", path)? {
                opts.push(TypeOption::MaxValue(n));
            }
        }
        Primitive::Integer | Primitive::Number => {
            if let Some(n) = bound(obj, "minimum", path)? {
                opts.push(match n.as_i64() {
                    Some(i) => TypeOption::MinValue(i),
                    None => TypeOption::MinFloat(n.clone()),
                });
            }
            if let Some(n) = bound(obj, "maximum", path)? {
                opts.push(match n.as_i64() {
                    Some(i) => TypeOption::MaxValue(i),
                    None => TypeOption::MaxFloat(n.clone()),
                });
            }
        }
        Primitive::Boolean | Primitive::Binary => {}
    }
    Ok(opts)
}

/// A numeric bound; anything other than a number is rejected
fn bound<'v>(obj: &'v Map<String, Value>, key: &str, path: &str) -> Result<Option<&'v Number>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n)),
        Some(other) => Err(TranslateError::unsupported(path, format!("{} is not a number: {}", key, other))),
    }
}

/// A string length bound, which must be a non-negative integer
fn length(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<i64>> {
    let Some(v) = obj.get(key) else {
        return Ok(None);
    };
    v.as_u64()
        .and_then(|n| i64::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| TranslateError::unsupported(path, format!("{} is not a non-negative integer: {}", key, v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(doc: Value) -> Translation {
        let mut registry = NamespaceRegistry::new("common");
        translate(&doc, &NamingConfig::default(), &mut registry).unwrap()
    }

    #[test]
    fn test_widget_record() {
        let t = run(json!({
            "$id": "http://example.com/widget-schema.json",
            "definitions": {
                "Widget": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "tags": {"type": "array", "maxItems": 5, "items": {"type": "string"}}
                    },
                    "required": ["id"]
                }
            }
        }));
        assert_eq!(t.schema.types.len(), 1);
        let widget = &t.schema.types[0];
        assert_eq!(widget.name, "n01:Widget");
        assert_eq!(widget.base_kind, BaseKind::Record);
        assert_eq!(
            widget.fields,
            vec![
                Field::structured(1, "id", "String", vec![], ""),
                Field::structured(
                    2,
                    "tags",
                    "String",
                    vec![TypeOption::MinCount(0), TypeOption::MaxCount(5)],
                    ""
                ),
            ]
        );
        assert_eq!(t.schema.info.package, "http://example.com/widget");
    }

    #[test]
    fn test_reference_substitution_and_alias() {
        let t = run(json!({
            "$id": "http://example.com/a-schema.json",
            "definitions": {
                "Part": {"type": "object", "properties": {"n": {"type": "integer"}}},
                "Holder": {
                    "type": "object",
                    "properties": {"part": {"$ref": "#/definitions/Part"}}
                },
                "Renamed": {"$id": "#field_demo_renamed", "$ref": "#/definitions/Part", "description": "kept"}
            }
        }));
        let holder = t.schema.get("n01:Holder").unwrap();
        assert_eq!(holder.fields[0].as_struct().unwrap().type_ref, "n01:Part");

        let alias = t.schema.get("n02:Renamed").unwrap();
        assert_eq!(alias.base_kind, BaseKind::Choice(ChoiceDiscipline::ExactlyOne));
        assert_eq!(alias.description, "kept");
        assert_eq!(alias.fields, vec![Field::structured(1, "alias", "n01:Part", vec![], "")]);
        assert!(t.stats.aliases.contains("n02:Renamed"));
    }

    #[test]
    fn test_anonymous_dedup() {
        // Two definitions sharing an $id resolve to the same names and
        // produce one record each, not two
        let lid = json!({"type": "object", "properties": {"color": {"type": "string"}}});
        let t = run(json!({
            "$id": "http://example.com/d-schema.json",
            "definitions": {
                "Box": {"$id": "#assembly_demo_box", "type": "object", "properties": {"lid": lid}},
                "Box-copy": {"$id": "#assembly_demo_box", "type": "object", "properties": {"lid": lid}},
                "Crate": {"$ref": "#assembly_demo_box"}
            }
        }));
        let names: Vec<&str> = t.schema.type_names().collect();
        assert_eq!(names, vec!["n01:Box.lid", "n01:Box"]);
    }

    #[test]
    fn test_same_name_different_structure() {
        let mut registry = NamespaceRegistry::new("common");
        let doc = json!({
            "$id": "http://example.com/d-schema.json",
            "definitions": {
                "Box": {"$id": "#assembly_demo_box", "type": "object", "properties": {"a": {"type": "string"}}},
                "Box-copy": {
                    "$id": "#assembly_demo_box",
                    "type": "object",
                    "properties": {"b": {"type": "string"}, "c": {"type": "integer"}}
                }
            }
        });
        let err = translate(&doc, &NamingConfig::default(), &mut registry).unwrap_err();
        match err {
            TranslateError::TypeConflict { name } => assert_eq!(name, "n01:Box"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_union_enum_and_standalone_array() {
        let t = run(json!({
            "$id": "http://example.com/u-schema.json",
            "definitions": {
                "Shape": {"oneOf": [
                    {"type": "object", "properties": {"r": {"type": "number"}}},
                    {"type": "string", "enum": ["square", "triangle"]}
                ]},
                "Names": {"type": "array", "minItems": 1, "items": {"type": "string", "pattern": "^[a-z]+$"}}
            }
        }));
        let shape = t.schema.get("n01:Shape").unwrap();
        assert_eq!(shape.base_kind, BaseKind::Choice(ChoiceDiscipline::ExactlyOne));
        let branches: Vec<&str> = shape.fields.iter().map(|f| f.as_struct().unwrap().type_ref.as_str()).collect();
        assert_eq!(branches, vec!["n01:Shape.1", "n01:Shape.2"]);
        let kinds = t.schema.get("n01:Shape.2").unwrap();
        assert_eq!(kinds.base_kind, BaseKind::Enumerated);
        assert_eq!(kinds.fields[1], Field::item(2, "triangle", ""));

        let names = t.schema.get("n01:Names").unwrap();
        assert_eq!(
            names.options,
            vec![TypeOption::ValueType("n01:Names.items".to_string()), TypeOption::MinValue(1)]
        );
        let item = t.schema.get("n01:Names.items").unwrap();
        assert_eq!(item.options, vec![TypeOption::Pattern("^[a-z]+$".to_string())]);
    }

    #[test]
    fn test_positional_array() {
        let t = run(json!({
            "$id": "http://example.com/p-schema.json",
            "definitions": {
                "Point": {"type": "array", "items": [{"type": "number"}, {"type": "number"}, {"type": "string"}]}
            }
        }));
        let point = t.schema.get("n01:Point").unwrap();
        assert_eq!(point.base_kind, BaseKind::Array);
        let fields: Vec<(&str, &str)> = point
            .fields
            .iter()
            .filter_map(Field::as_struct)
            .map(|f| (f.name.as_str(), f.type_ref.as_str()))
            .collect();
        assert_eq!(fields, vec![("p1", "Number"), ("p2", "Number"), ("p3", "String")]);
    }

    #[test]
    fn test_unsupported_construct() {
        let mut registry = NamespaceRegistry::new("common");
        let doc = json!({
            "$id": "http://example.com/x-schema.json",
            "definitions": {"Odd": {"type": "object", "properties": {"v": {"const": 3}}}}
        });
        let err = translate(&doc, &NamingConfig::default(), &mut registry).unwrap_err();
        match err {
            TranslateError::UnsupportedSchemaConstruct { path, .. } => assert_eq!(path, "Odd.v"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_root_marker() {
        let t = run(json!({
            "$id": "http://example.com/cat-schema.json",
            "title": "Catalog",
            "definitions": {
                "assembly_oscal-catalog_catalog": {
                    "$id": "#assembly_oscal-catalog_catalog",
                    "type": "object",
                    "properties": {"uuid": {"type": "string", "format": "uuid"}},
                    "required": ["uuid"]
                }
            },
            "properties": {"catalog": {"$ref": "#assembly_oscal-catalog_catalog"}},
            "required": ["catalog"]
        }));
        assert_eq!(t.schema.info.roots, vec!["n01:$Root".to_string()]);
        let marker = t.schema.get("n01:$Root").unwrap();
        assert_eq!(marker.fields, vec![Field::structured(1, "catalog", "n01:Catalog", vec![], "")]);
        // Nested primitive with options gets a named type
        assert!(t.schema.get("n01:Catalog.uuid").is_some());
        assert_eq!(t.schema.info.title.as_deref(), Some("Catalog"));
        assert_eq!(t.schema.info.namespaces[0].origin_uri, "http://example.com/oscal-catalog");
    }

    #[test]
    fn test_inclusive_and_all_required_unions() {
        let t = run(json!({
            "$id": "http://example.com/u-schema.json",
            "definitions": {
                "Either": {"anyOf": [{"type": "string"}, {"type": "integer"}]},
                "Both": {"allOf": [
                    {"type": "object", "properties": {"x": {"type": "number"}}},
                    {"type": "object", "properties": {"y": {"type": "number"}}}
                ]}
            }
        }));
        let either = t.schema.get("n01:Either").unwrap();
        assert_eq!(either.base_kind, BaseKind::Choice(ChoiceDiscipline::InclusiveOr));
        let branches: Vec<&str> = either.fields.iter().map(|f| f.as_struct().unwrap().type_ref.as_str()).collect();
        assert_eq!(branches, vec!["String", "Integer"]);

        let both = t.schema.get("n01:Both").unwrap();
        assert_eq!(both.base_kind, BaseKind::Choice(ChoiceDiscipline::AllRequired));
        assert!(t.schema.get("n01:Both.1").is_some());
        assert!(t.schema.get("n01:Both.2").is_some());
    }

    #[test]
    fn test_multiple_root_marker() {
        let t = run(json!({
            "$id": "http://example.com/oscal-schema.json",
            "definitions": {
                "assembly_oscal-catalog_catalog": {
                    "$id": "#assembly_oscal-catalog_catalog",
                    "type": "object",
                    "properties": {"title": {"type": "string"}}
                },
                "assembly_oscal-profile_profile": {
                    "$id": "#assembly_oscal-profile_profile",
                    "type": "object",
                    "properties": {"title": {"type": "string"}}
                }
            },
            "oneOf": [
                {"properties": {"catalog": {"$ref": "#assembly_oscal-catalog_catalog"}}, "required": ["catalog"]},
                {"properties": {"profile": {"$ref": "#assembly_oscal-profile_profile"}}, "required": ["profile"]}
            ]
        }));
        assert_eq!(t.schema.info.roots, vec!["n01:$Root".to_string()]);
        let marker = t.schema.get("n01:$Root").unwrap();
        assert_eq!(marker.base_kind, BaseKind::Choice(ChoiceDiscipline::ExactlyOne));
        assert_eq!(
            marker.fields,
            vec![
                Field::structured(1, "catalog", "n01:Catalog", vec![], ""),
                Field::structured(2, "profile", "n02:Profile", vec![], ""),
            ]
        );
    }

    #[test]
    fn test_fractional_bounds() {
        let t = run(json!({
            "$id": "http://example.com/n-schema.json",
            "definitions": {
                "Ratio": {"type": "number", "minimum": 0.5, "maximum": 1.5},
                "Percent": {"type": "integer", "minimum": 0, "maximum": 100}
            }
        }));
        let ratio = t.schema.get("n01:Ratio").unwrap();
        assert_eq!(
            ratio.options,
            vec![
                TypeOption::MinFloat(Number::from_f64(0.5).unwrap()),
                TypeOption::MaxFloat(Number::from_f64(1.5).unwrap()),
            ]
        );
        let percent = t.schema.get("n01:Percent").unwrap();
        assert_eq!(percent.options, vec![TypeOption::MinValue(0), TypeOption::MaxValue(100)]);
    }

    #[test]
    fn test_non_numeric_bound_rejected() {
        let mut registry = NamespaceRegistry::new("common");
        let doc = json!({
            "$id": "http://example.com/n-schema.json",
            "definitions": {"Name": {"type": "string", "maxLength": 2.5}}
        });
        let err = translate(&doc, &NamingConfig::default(), &mut registry).unwrap_err();
        match err {
            TranslateError::UnsupportedSchemaConstruct { path, .. } => assert_eq!(path, "Name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_positional_array_property_counts() {
        let t = run(json!({
            "$id": "http://example.com/p-schema.json",
            "definitions": {
                "Shape": {
                    "type": "object",
                    "properties": {
                        "corner": {"type": "array", "items": [{"type": "number"}, {"type": "number"}]}
                    },
                    "required": ["corner"]
                }
            }
        }));
        let shape = t.schema.get("n01:Shape").unwrap();
        let corner = shape.fields[0].as_struct().unwrap();
        assert_eq!(corner.type_ref, "n01:Shape.corner");
        assert_eq!(corner.options, vec![TypeOption::MaxCount(0)]);
        assert_eq!(t.schema.get("n01:Shape.corner").unwrap().base_kind, BaseKind::Array);
    }

    #[test]
    fn test_pointer_to_qualified_definition() {
        // A #/definitions/ pointer to a definition with a qualified $id uses
        // only that definition's namespace
        let t = run(json!({
            "$id": "http://example.com/oscal-catalog-schema.json",
            "definitions": {
                "catalog": {
                    "$id": "#assembly_oscal-catalog_catalog",
                    "type": "object",
                    "properties": {"group": {"$ref": "#/definitions/group"}}
                },
                "group": {
                    "$id": "#assembly_oscal-catalog_group",
                    "type": "object",
                    "properties": {"title": {"type": "string"}}
                }
            }
        }));
        let catalog = t.schema.get("n01:Catalog").unwrap();
        assert_eq!(catalog.fields[0].as_struct().unwrap().type_ref, "n01:Group");
        let prefixes: Vec<&str> = t.schema.info.namespaces.iter().map(|n| n.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["n01"]);
    }
}
