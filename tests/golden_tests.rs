//! Golden Tests for Document Translation
//!
//! Runs whole documents from `tests/fixtures` through walk, graph, order and
//! split, and checks the resulting tables.

use std::fs;

use schema_canon::codegen::{Emitter, JadnEmitter};
use schema_canon::config::NamingConfig;
use schema_canon::graph::{build_graph, order, DiagnosticCode};
use schema_canon::ir::{BaseKind, ChoiceDiscipline, Field, Primitive, TypeOption};
use schema_canon::loader::{finish, load_from_directory, translate_batch, SourceBundle, SourceDocument};
use schema_canon::package::split;
use schema_canon::walk::json;
use schema_canon::{CanonicalSchema, NamespaceRegistry, TranslateConfig, TranslateError};

fn translate_json(text: &str, registry: &mut NamespaceRegistry) -> schema_canon::loader::DocumentResult {
    let value: serde_json::Value = serde_json::from_str(text).unwrap();
    let translation = json::translate(&value, &NamingConfig::default(), registry).unwrap();
    finish(translation).unwrap()
}

fn names(schema: &CanonicalSchema) -> Vec<&str> {
    schema.type_names().collect()
}

// =============================================================================
// Walk Scenarios
// =============================================================================

#[test]
fn test_widget_scenario() {
    let mut registry = NamespaceRegistry::new("common");
    let result = translate_json(include_str!("fixtures/widgets_schema.json"), &mut registry);

    // Item type of `tags` elides to the bare kind: one type only
    assert_eq!(names(&result.schema), vec!["n01:Widget"]);
    let widget = &result.schema.types[0];
    assert_eq!(widget.base_kind, BaseKind::Record);
    assert_eq!(widget.description, "A thing with tags");
    assert_eq!(
        widget.fields,
        vec![
            Field::structured(1, "id", "String", vec![], ""),
            Field::structured(2, "tags", "String", vec![TypeOption::MinCount(0), TypeOption::MaxCount(5)], ""),
        ]
    );
    assert_eq!(result.schema.info.package, "http://example.org/ns/widgets/1.0/widgets");
    assert_eq!(result.schema.info.title.as_deref(), Some("Widgets"));
}

#[test]
fn test_root_dependency_orphan_scenario() {
    let mut registry = NamespaceRegistry::new("common");
    let result = translate_json(include_str!("fixtures/orphans_schema.json"), &mut registry);

    assert_eq!(
        names(&result.schema),
        vec!["n01:$Root", "n01:A", "n01:B", "n01:C"]
    );
    let unreferenced: Vec<&str> = result
        .diagnostics
        .with_code(DiagnosticCode::Unreferenced)
        .map(|d| d.subject.as_str())
        .collect();
    assert_eq!(unreferenced, vec!["n01:C"]);

    // Same table ordered from an explicit root
    let graph = build_graph(&result.schema.types);
    let ordering = order(&graph, &["n01:A".to_string()]).unwrap();
    assert_eq!(ordering.types[..3], ["n01:A", "n01:B", "n01:$Root"].map(String::from));
    assert!(ordering.unreferenced.contains(&"n01:C".to_string()));
}

#[test]
fn test_catalog_combined_order() {
    let mut registry = NamespaceRegistry::new("common");
    let result = translate_json(include_str!("fixtures/oscal_catalog_schema.json"), &mut registry);

    assert_eq!(
        names(&result.schema),
        vec![
            "n01:$Root",
            "n01:Catalog",
            "n01:Group",
            "n02:Metadata",
            "n01:Part",
            "n02:Location-type",
            "n02:Uuid",
            "n02:Metadata.last-modified",
            "n02:Metadata.props",
            "n01:Part.name",
            "n01:Catalog-ref",
            "n01:Status.1",
            "n01:Status.2",
            "n01:Status",
        ]
    );

    let diags = &result.diagnostics;
    assert_eq!(diags.with_code(DiagnosticCode::SelfLoopDetected).count(), 2);
    assert_eq!(diags.with_code(DiagnosticCode::Unreferenced).count(), 4);
    assert_eq!(diags.with_code(DiagnosticCode::Alias).count(), 1);
    assert_eq!(diags.with_code(DiagnosticCode::InvalidTypeName).count(), 0);

    let catalog = result.schema.get("n01:Catalog").unwrap();
    let groups = catalog.fields[2].as_struct().unwrap();
    assert_eq!(groups.type_ref, "n01:Group");
    assert_eq!(groups.options, vec![TypeOption::MinCount(0), TypeOption::MaxCount(0)]);

    let alias = result.schema.get("n01:Catalog-ref").unwrap();
    assert_eq!(alias.base_kind, BaseKind::Choice(ChoiceDiscipline::ExactlyOne));
    assert_eq!(alias.fields, vec![Field::structured(1, "alias", "n01:Catalog", vec![], "")]);

    let props = result.schema.get("n02:Metadata.props").unwrap();
    assert_eq!(props.base_kind, BaseKind::MapOf);
    assert_eq!(
        props.options,
        vec![TypeOption::KeyType("String".into()), TypeOption::ValueType("String".into())]
    );

    let uuid = result.schema.get("n02:Uuid").unwrap();
    assert_eq!(uuid.base_kind, BaseKind::Primitive(Primitive::String));
    assert_eq!(uuid.options, vec![TypeOption::Format("uuid".into())]);

    assert_eq!(result.schema.info.roots, vec!["n01:$Root".to_string()]);
    assert_eq!(result.schema.info.comment.as_deref(), Some("Catalog fixture"));
    assert_eq!(result.schema.info.version.as_deref(), Some("1.0.0"));
}

#[test]
fn test_translation_is_deterministic() {
    let text = include_str!("fixtures/oscal_catalog_schema.json");
    let emitter = JadnEmitter::new(false);

    let mut first_registry = NamespaceRegistry::new("common");
    let first = emitter.emit(&translate_json(text, &mut first_registry).schema).unwrap();
    let mut second_registry = NamespaceRegistry::new("common");
    let second = emitter.emit(&translate_json(text, &mut second_registry).schema).unwrap();
    assert_eq!(first, second);

    // Re-walking with a warm registry reuses its prefixes
    let before = first_registry.len();
    let third = emitter.emit(&translate_json(text, &mut first_registry).schema).unwrap();
    assert_eq!(first_registry.len(), before);
    assert_eq!(first, third);
}

#[test]
fn test_every_type_has_a_graph_key() {
    let mut registry = NamespaceRegistry::new("common");
    let result = translate_json(include_str!("fixtures/oscal_catalog_schema.json"), &mut registry);
    for t in &result.schema.types {
        assert!(result.graph.contains(&t.name), "{} missing from graph", t.name);
    }
    assert!(result.graph.deps["n02:Uuid"].is_empty());
}

// =============================================================================
// Package Split
// =============================================================================

#[test]
fn test_catalog_packages() {
    let mut registry = NamespaceRegistry::new("common");
    let result = translate_json(include_str!("fixtures/oscal_catalog_schema.json"), &mut registry);
    let split_result = split(&[result.schema], &registry, &NamingConfig::default()).unwrap();

    let package_names: Vec<&str> = split_result.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(package_names, vec!["oscal-catalog", "oscal-metadata"]);

    let catalog = &split_result.get("oscal-catalog").unwrap().schema;
    assert_eq!(catalog.info.package, "http://example.org/ns/oscal/1.0/oscal-catalog");
    assert_eq!(catalog.info.title.as_deref(), Some("Catalog Model"));
    assert_eq!(catalog.info.roots, vec!["$Root", "Catalog-ref", "Status"]);
    assert_eq!(catalog.types.len(), 9);
    assert_eq!(catalog.types[0].name, "$Root");
    let ns: Vec<(&str, &str)> = catalog
        .info
        .namespaces
        .iter()
        .map(|n| (n.prefix.as_str(), n.origin_uri.as_str()))
        .collect();
    assert_eq!(ns, vec![("n02", "http://example.org/ns/oscal/1.0/oscal-metadata")]);

    let fields: Vec<&str> = catalog
        .get("Catalog")
        .unwrap()
        .fields
        .iter()
        .filter_map(Field::as_struct)
        .map(|f| f.type_ref.as_str())
        .collect();
    assert_eq!(fields, vec!["n02:Uuid", "n02:Metadata", "Group"]);

    let metadata = &split_result.get("oscal-metadata").unwrap().schema;
    assert_eq!(metadata.info.package, "http://example.org/ns/oscal/1.0/oscal-metadata");
    assert_eq!(metadata.info.roots, vec!["Metadata", "Uuid"]);
    assert!(metadata.info.namespaces.is_empty());
    assert_eq!(metadata.types.len(), 5);
}

#[test]
fn test_package_locality() {
    let mut registry = NamespaceRegistry::new("common");
    let result = translate_json(include_str!("fixtures/oscal_catalog_schema.json"), &mut registry);
    let split_result = split(&[result.schema], &registry, &NamingConfig::default()).unwrap();

    for package in &split_result.packages {
        let local: Vec<&str> = package.schema.type_names().collect();
        for t in &package.schema.types {
            for reference in t.references() {
                if !reference.contains(':') {
                    assert!(
                        local.contains(&reference),
                        "{}: {} refers to {} outside the package",
                        package.name,
                        t.name,
                        reference
                    );
                }
            }
        }
    }
}

// =============================================================================
// Metaschema
// =============================================================================

fn metaschema_bundle() -> SourceBundle {
    SourceBundle {
        documents: vec![
            SourceDocument::new("oscal_catalog_metaschema.xml", include_str!("fixtures/oscal_catalog_metaschema.xml")).unwrap(),
            SourceDocument::new("oscal_metadata_metaschema.xml", include_str!("fixtures/oscal_metadata_metaschema.xml")).unwrap(),
        ],
        bundle_hash: String::new(),
    }
}

#[test]
fn test_metaschema_batch() {
    let mut registry = NamespaceRegistry::new("common");
    let batch = translate_batch(&metaschema_bundle(), &NamingConfig::default(), &mut registry);
    assert!(batch.is_success(), "{:?}", batch.failures);

    let catalog = &batch.documents[0].schema;
    assert_eq!(catalog.info.package, "http://csrc.nist.gov/ns/oscal/1.0/1.1.2/oscal-catalog");
    assert_eq!(catalog.info.title.as_deref(), Some("OSCAL Control Catalog Model"));
    assert_eq!(catalog.info.description.as_deref(), Some("A catalog is a collection of controls."));
    assert_eq!(
        names(catalog),
        vec!["n01:$Root", "n01:Catalog", "n01:Group", "n03:TokenDatatype"]
    );

    let record = catalog.get("n01:Catalog").unwrap();
    let fields: Vec<(&str, &str)> = record
        .fields
        .iter()
        .filter_map(Field::as_struct)
        .map(|f| (f.name.as_str(), f.type_ref.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![("uuid", "n02:Uuid"), ("metadata", "n02:Metadata"), ("groups", "n01:Group")]
    );

    let group = catalog.get("n01:Group").unwrap();
    let prose = group.fields[3].as_struct().unwrap();
    assert_eq!((prose.name.as_str(), prose.type_ref.as_str()), ("prose", "String"));
    assert_eq!(prose.options, vec![TypeOption::MinCount(0), TypeOption::MaxCount(1)]);

    // Imported names are undefined within the module itself
    assert!(batch.documents[0]
        .diagnostics
        .with_code(DiagnosticCode::UndefinedReference)
        .any(|d| d.message.contains("n02:Metadata")));

    let metadata = &batch.documents[1].schema;
    assert_eq!(
        names(metadata),
        vec!["n02:Metadata", "n02:Uuid", "n02:Last-modified", "n02:Title"]
    );
    let uuid = metadata.get("n02:Uuid").unwrap();
    assert_eq!(uuid.base_kind, BaseKind::Primitive(Primitive::Binary));
    assert_eq!(uuid.description, "Universally Unique Identifier");
}

#[test]
fn test_metaschema_packages() {
    let mut registry = NamespaceRegistry::new("common");
    let batch = translate_batch(&metaschema_bundle(), &NamingConfig::default(), &mut registry);
    let split_result = split(&batch.schemas(), &registry, &NamingConfig::default()).unwrap();

    let package_names: Vec<&str> = split_result.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(package_names, vec!["oscal-catalog", "oscal-metadata", "common"]);

    let catalog = &split_result.get("oscal-catalog").unwrap().schema;
    assert_eq!(catalog.info.roots, vec!["$Root"]);
    let prefixes: Vec<&str> = catalog.info.namespaces.iter().map(|n| n.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["n02", "n03"]);

    let common = &split_result.get("common").unwrap().schema;
    assert_eq!(common.info.package, "http://csrc.nist.gov/ns/oscal/1.0/1.1.2/common");
    assert_eq!(names(common), vec!["TokenDatatype"]);
}

// =============================================================================
// Batch Isolation
// =============================================================================

#[test]
fn test_failing_document_does_not_stop_batch() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("a_broken.json"), r#"{"definitions": {}}"#).unwrap();
    fs::write(dir.path().join("b_widgets.json"), include_str!("fixtures/widgets_schema.json")).unwrap();
    fs::write(dir.path().join("c_orphans.json"), include_str!("fixtures/orphans_schema.json")).unwrap();

    let config = TranslateConfig::default();
    let mut registry = NamespaceRegistry::from_config(&config);
    let batch = load_from_directory(dir.path(), &config.input, &config.naming, &mut registry).unwrap();

    assert_eq!(batch.failures.len(), 1);
    assert!(matches!(batch.failures[0].error, TranslateError::InvalidDocument(_)));
    assert_eq!(batch.documents.len(), 2);
    assert_eq!(batch.bundle_hash.len(), 64);
    // Both good documents share the default namespace prefix
    assert_eq!(batch.documents[0].schema.types[0].name, "n01:Widget");
    assert_eq!(batch.documents[1].schema.types[0].name, "n01:$Root");
}
