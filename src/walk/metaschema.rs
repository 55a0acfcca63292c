//! XML Metaschema front-end
//!
//! Metaschema modules import each other, so names are resolved against a
//! [`MetaschemaCatalog`] built from every module of the batch before any
//! module is walked.
//!
//! Mapping:
//!
//! | Metaschema                    | Canonical type                         |
//! |-------------------------------|----------------------------------------|
//! | `define-assembly`             | Record (Choice if the model is one `choice`) |
//! | `define-field` with flags     | Record with a `value` field            |
//! | `define-field` / `define-flag`| primitive from `as-type`               |
//! | closed `allowed-values`       | Enumerated                             |
//! | `root-name`                   | field of the `$Root` marker            |

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::NamingConfig;
use crate::error::{Result, TranslateError};
use crate::ir::{
    make_type, BaseKind, CanonicalSchema, ChoiceDiscipline, Field, Namespace, PackageInfo, Primitive, TypeName,
    TypeOption, TypeRef,
};
use crate::resolve::{capitalize, NamespaceRegistry};

use super::xml::Element;
use super::{package_base, Translation, TranslationSession};

/// Suffix for types generated from Metaschema datatypes
pub const DATATYPE_SUFFIX: &str = "Datatype";

const DATE_PATTERN: &str = r"^(((2000|2400|2800|(19|2[0-9](0[48]|[2468][048]|[13579][26])))-02-29)|(((19|2[0-9])[0-9]{2})-02-(0[1-9]|1[0-9]|2[0-8]))|(((19|2[0-9])[0-9]{2})-(0[13578]|10|12)-(0[1-9]|[12][0-9]|3[01]))|(((19|2[0-9])[0-9]{2})-(0[469]|11)-(0[1-9]|[12][0-9]|30)))(Z|(-((0[0-9]|1[0-2]):00|0[39]:30)|\+((0[0-9]|1[0-4]):00|(0[34569]|10):30|(0[58]|12):45)))?$";
const DATETIME_TZ_PATTERN: &str = r"^(((2000|2400|2800|(19|2[0-9](0[48]|[2468][048]|[13579][26])))-02-29)|(((19|2[0-9])[0-9]{2})-02-(0[1-9]|1[0-9]|2[0-8]))|(((19|2[0-9])[0-9]{2})-(0[13578]|10|12)-(0[1-9]|[12][0-9]|3[01]))|(((19|2[0-9])[0-9]{2})-(0[469]|11)-(0[1-9]|[12][0-9]|30)))T(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])(\.[0-9]+)?(Z|(-((0[0-9]|1[0-2]):00|0[39]:30)|\+((0[0-9]|1[0-4]):00|(0[34569]|10):30|(0[58]|12):45)))$";

// =============================================================================
// Datatypes
// =============================================================================

/// Canonical form of a Metaschema datatype
#[derive(Debug, Clone, PartialEq)]
pub struct Datatype {
    pub primitive: Primitive,
    pub options: Vec<TypeOption>,
    pub description: &'static str,
}

pub fn datatype(name: &str) -> Option<Datatype> {
    use Primitive as P;
    let fmt = |s: &str| TypeOption::Format(s.to_string());
    let pat = |s: &str| TypeOption::Pattern(s.to_string());

    let (primitive, options, description) = match name {
        "base64" => (P::Binary, vec![fmt("b64")], "Binary data encoded using the Base 64 encoding algorithm as defined by RFC4648."),
        "boolean" => (P::Boolean, vec![], "A binary value that is either: true or false."),
        "date" => (P::String, vec![pat(DATE_PATTERN)], "A string representing a 24-hour period with an optional timezone."),
        "dateTime-with-timezone" => (
            P::String,
            vec![fmt("date-time"), pat(DATETIME_TZ_PATTERN)],
            "A string representing a point in time with a required timezone.",
        ),
        "date-time" | "dateTime" => (P::String, vec![fmt("date-time")], "A string representing a point in time."),
        "decimal" => (P::Number, vec![], "A real number expressed using a whole and optional fractional part."),
        "integer" => (P::Integer, vec![], "A whole number value."),
        "nonNegativeInteger" => (P::Integer, vec![TypeOption::MinValue(0)], "An integer value that is equal to or greater than 0."),
        "positiveInteger" => (P::Integer, vec![TypeOption::MinValue(1)], "An integer value that is greater than 0."),
        "string" => (
            P::String,
            vec![pat(r"^\S(.*\S)?$")],
            "A non-empty string with leading and trailing whitespace disallowed.",
        ),
        "token" | "NCName" => (
            P::String,
            vec![pat(r"^(\p{L}|_)(\p{L}|\p{N}|[.\-_])*$")],
            "A non-colonized name as defined by XML Schema Part 2.",
        ),
        "uuid" => (P::Binary, vec![fmt("uuid")], "A type 4 or type 5 UUID per RFC 4122."),
        "uri" => (
            P::String,
            vec![fmt("uri"), pat(r"^[a-zA-Z][a-zA-Z0-9+\-.]+:.+$")],
            "A universal resource identifier (URI) formatted according to RFC3986.",
        ),
        "uri-reference" => (P::String, vec![fmt("uri-reference")], "A URI Reference formatted according to section 4.1 of RFC3986."),
        "email-address" | "email" => (P::String, vec![fmt("email")], "An email address."),
        "hostname" => (P::String, vec![fmt("hostname")], "An internationalized Internet host name."),
        "ip-v4-address" => (P::String, vec![fmt("ipv4")], "An Internet Protocol version 4 address."),
        "ip-v6-address" => (P::String, vec![fmt("ipv6")], "An Internet Protocol version 6 address."),
        "markup-line" | "markup-multiline" => (P::String, vec![], "Formatted text."),
        _ => return None,
    };
    Some(Datatype {
        primitive,
        options,
        description,
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// Definition namespaces of a module; names never collide across kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DefinitionKind {
    Assembly,
    Field,
    Flag,
}

impl DefinitionKind {
    /// Kind of a `define-*` or reference element
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "define-assembly" | "assembly" => Some(Self::Assembly),
            "define-field" | "field" => Some(Self::Field),
            "define-flag" | "flag" => Some(Self::Flag),
            _ => None,
        }
    }
}

/// Header of one Metaschema module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    pub file: String,
    pub short_name: String,
    /// `namespace/version/short-name`
    pub package: String,
    pub version: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Imported module file names
    pub imports: Vec<String>,
}

impl ModuleInfo {
    pub fn from_root(file: &str, root: &Element) -> Result<Self> {
        if root.name != "METASCHEMA" {
            return Err(TranslateError::InvalidDocument(format!(
                "{}: root element is {}, expected METASCHEMA",
                file, root.name
            )));
        }
        let short_name = root
            .child_text("short-name")
            .ok_or_else(|| TranslateError::InvalidDocument(format!("{}: missing short-name", file)))?;
        let namespace = root
            .child_text("namespace")
            .ok_or_else(|| TranslateError::InvalidDocument(format!("{}: missing namespace", file)))?;
        let version = root.child_text("schema-version");
        let package = match &version {
            Some(v) => format!("{}/{}/{}", namespace.trim_end_matches('/'), v, short_name),
            None => format!("{}/{}", namespace.trim_end_matches('/'), short_name),
        };
        let imports = root
            .elements()
            .filter(|e| e.name == "import")
            .filter_map(|e| e.attr("href"))
            .map(file_name)
            .collect();

        Ok(Self {
            file: file.to_string(),
            short_name,
            package,
            version,
            title: root.child_text("schema-name"),
            description: root.child_text("remarks"),
            imports,
        })
    }
}

fn file_name(href: &str) -> String {
    Path::new(href)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| href.to_string())
}

/// Every module of a batch and who defines which global name
#[derive(Debug, Clone, Default)]
pub struct MetaschemaCatalog {
    modules: BTreeMap<String, ModuleInfo>,
    definers: BTreeMap<(DefinitionKind, String), Vec<String>>,
}

impl MetaschemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's header and global definitions
    pub fn add(&mut self, file: &str, root: &Element) -> Result<()> {
        let module = ModuleInfo::from_root(file, root)?;
        for e in root.elements() {
            if !e.name.starts_with("define-") {
                continue;
            }
            let (Some(kind), Some(name)) = (DefinitionKind::from_tag(&e.name), e.attr("name")) else {
                continue;
            };
            let definers = self.definers.entry((kind, name.to_string())).or_default();
            if !definers.contains(&module.short_name) {
                definers.push(module.short_name.clone());
            }
        }
        self.modules.insert(file_name(file), module);
        Ok(())
    }

    pub fn module(&self, file: &str) -> Option<&ModuleInfo> {
        self.modules.get(&file_name(file))
    }

    pub fn module_by_short_name(&self, short_name: &str) -> Option<&ModuleInfo> {
        self.modules.values().find(|m| m.short_name == short_name)
    }

    /// Short name of the module that defines `name`, seen from `current`:
    /// the current module first, then its imports, then any definer.
    pub fn owner(&self, kind: DefinitionKind, name: &str, current: &ModuleInfo) -> Option<&str> {
        let definers = self.definers.get(&(kind, name.to_string()))?;
        if let Some(own) = definers.iter().find(|d| **d == current.short_name) {
            return Some(own.as_str());
        }
        for import in &current.imports {
            if let Some(m) = self.modules.get(import) {
                if definers.contains(&m.short_name) {
                    return Some(m.short_name.as_str());
                }
            }
        }
        definers.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// =============================================================================
// Walker
// =============================================================================

/// Translate one module. The module must already be in `catalog`.
pub fn translate(
    root: &Element,
    file: &str,
    catalog: &MetaschemaCatalog,
    naming: &NamingConfig,
    registry: &mut NamespaceRegistry,
) -> Result<Translation> {
    let module = catalog
        .module(file)
        .ok_or_else(|| TranslateError::InvalidDocument(format!("{} is not in the catalog", file)))?;

    let mut walker = MetaschemaWalker {
        session: TranslationSession::new(naming, registry)?,
        catalog,
        module,
        roots: Vec::new(),
    };

    for e in root.elements() {
        match e.name.as_str() {
            "define-assembly" | "define-field" | "define-flag" => walker.build_global(e)?,
            other => tracing::trace!("skipping <{}>", other),
        }
    }

    let mut info = PackageInfo::new(module.package.clone());
    info.version = module.version.clone();
    info.title = module.title.clone();
    info.description = module.description.clone();
    if let Some(marker) = walker.add_root_marker()? {
        info.roots.push(marker);
    }

    let mut session = walker.session;
    session.check_names()?;
    let base = package_base(&info.package);
    let used = session.registry.used_keys();
    info.namespaces = session
        .registry
        .entries()
        .filter(|(key, _)| used.contains(*key))
        .map(|(key, prefix)| {
            let uri = catalog
                .module_by_short_name(key)
                .map(|m| m.package.clone())
                .unwrap_or_else(|| session.registry.uri(&base, key));
            Namespace::new(prefix, uri)
        })
        .collect();
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

struct MetaschemaWalker<'a> {
    session: TranslationSession<'a>,
    catalog: &'a MetaschemaCatalog,
    module: &'a ModuleInfo,
    /// (root-name, type) for the root marker
    roots: Vec<(String, TypeRef)>,
}

impl<'a> MetaschemaWalker<'a> {
    fn build_global(&mut self, e: &Element) -> Result<()> {
        let kind = self.kind_of(e)?;
        let name = self.required_attr(e, "name", &[])?;
        let path = vec![name.to_string()];
        let type_ref = self.build_definition(kind, e, &path, true)?;
        self.session.stats.ids.insert(type_ref.clone());

        if kind == DefinitionKind::Assembly {
            if let Some(root_name) = e.child_text("root-name") {
                self.roots.push((root_name, type_ref));
            }
        }
        Ok(())
    }

    /// Build the type for a definition at `path`. Global definitions always
    /// get a named type; inline primitives may come back as a bare kind.
    fn build_definition(&mut self, kind: DefinitionKind, e: &Element, path: &[String], global: bool) -> Result<TypeRef> {
        let desc = documentation(e);
        match kind {
            DefinitionKind::Assembly => {
                let name = self.local_type_name(path)?;
                let (base_kind, fields) = self.assembly_fields(e, path)?;
                self.session.add(make_type(name, base_kind, vec![], desc, fields))
            }
            DefinitionKind::Field if has_flags(e) => {
                let name = self.local_type_name(path)?;
                let value_type = self.datatype_ref(e.attr("as-type").unwrap_or("string"), path)?;
                let mut fields = vec![Field::structured(
                    1,
                    "value",
                    value_type,
                    vec![TypeOption::MinCount(1), TypeOption::MaxCount(1)],
                    "",
                )];
                for flag in e.elements().filter(|c| c.name == "flag" || c.name == "define-flag") {
                    let id = fields.len() as u32 + 1;
                    if let Some(field) = self.member_field(id, flag, path, &mut 0)? {
                        fields.push(field);
                    }
                }
                self.session.add(make_type(name, BaseKind::Record, vec![], desc, fields))
            }
            DefinitionKind::Field | DefinitionKind::Flag => {
                if let Some(items) = allowed_values(e) {
                    let name = self.local_type_name(path)?;
                    return self.session.add(make_type(name, BaseKind::Enumerated, vec![], desc, items));
                }
                let as_type = e.attr("as-type").unwrap_or("string");
                if !global {
                    return self.datatype_ref(as_type, path);
                }
                let dt = datatype(as_type).ok_or_else(|| self.unknown_datatype(as_type, path))?;
                let name = self.local_type_name(path)?;
                self.session
                    .add(make_type(name, BaseKind::Primitive(dt.primitive), dt.options, desc, vec![]))
            }
        }
    }

    fn assembly_fields(&mut self, e: &Element, path: &[String]) -> Result<(BaseKind, Vec<Field>)> {
        let flags: Vec<&Element> = e
            .elements()
            .filter(|c| c.name == "flag" || c.name == "define-flag")
            .collect();
        let model: Vec<&Element> = e
            .child("model")
            .map(|m| m.elements().filter(|c| is_model_member(&c.name)).collect())
            .unwrap_or_default();

        // A model that is a single choice makes the assembly itself a Choice
        if let ([], [choice]) = (flags.as_slice(), model.as_slice()) {
            if choice.name == "choice" {
                let fields = self.members(choice.elements().filter(|c| is_model_member(&c.name)), path)?;
                return Ok((BaseKind::Choice(ChoiceDiscipline::ExactlyOne), fields));
            }
        }

        let fields = self.members(flags.into_iter().chain(model), path)?;
        Ok((BaseKind::Record, fields))
    }

    fn members<'e>(&mut self, members: impl Iterator<Item = &'e Element>, path: &[String]) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        let mut choices = 0;
        for member in members {
            let id = fields.len() as u32 + 1;
            if let Some(field) = self.member_field(id, member, path, &mut choices)? {
                fields.push(field);
            }
        }
        Ok(fields)
    }

    /// One flag or model member as a field. `any` has no field.
    fn member_field(&mut self, id: u32, m: &Element, path: &[String], choices: &mut u32) -> Result<Option<Field>> {
        let desc = documentation(m);

        if m.name == "choice" {
            *choices += 1;
            let field_name = format!("choice{}", choices);
            let mut cpath = path.to_vec();
            cpath.push(field_name.clone());
            let name = self.local_type_name(&cpath)?;
            let fields = self.members(m.elements().filter(|c| is_model_member(&c.name)), &cpath)?;
            let choice_type = make_type(name, BaseKind::Choice(ChoiceDiscipline::ExactlyOne), vec![], "", fields);
            let type_ref = self.session.add(choice_type)?;
            return Ok(Some(Field::structured(id, field_name, type_ref, vec![], desc)));
        }

        let Some(kind) = DefinitionKind::from_tag(&m.name) else {
            return Ok(None);
        };
        let (field_name, type_ref) = if m.name.starts_with("define-") {
            let name = self.required_attr(m, "name", path)?.to_string();
            let mut mpath = path.to_vec();
            mpath.push(name.clone());
            (name, self.build_definition(kind, m, &mpath, false)?)
        } else {
            let reference = self.required_attr(m, "ref", path)?.to_string();
            self.session.stats.refs.insert(reference.clone());
            let type_ref = self.reference_type(kind, &reference)?;
            (reference, type_ref)
        };
        let field_name = group_as(m).unwrap_or(field_name);
        Ok(Some(Field::structured(id, field_name, type_ref, occurrence(m), desc)))
    }

    /// Type of a referenced global definition, in whichever module owns it
    fn reference_type(&mut self, kind: DefinitionKind, name: &str) -> Result<TypeName> {
        let owner = self.catalog.owner(kind, name, self.module).unwrap_or("").to_string();
        self.type_name(&owner, &[name.to_string()])
    }

    /// Bare primitive, or a shared datatype type when the datatype has options
    fn datatype_ref(&mut self, as_type: &str, path: &[String]) -> Result<TypeRef> {
        let dt = datatype(as_type).ok_or_else(|| self.unknown_datatype(as_type, path))?;
        if dt.options.is_empty() {
            return Ok(dt.primitive.as_str().to_string());
        }
        let local = format!("{}{}", as_type, DATATYPE_SUFFIX);
        let name = self.type_name("", &[local])?;
        self.session.add(make_type(
            name,
            BaseKind::Primitive(dt.primitive),
            dt.options,
            dt.description,
            vec![],
        ))
    }

    fn add_root_marker(&mut self) -> Result<Option<TypeRef>> {
        if self.roots.is_empty() {
            return Ok(None);
        }
        let prefix = self.session.registry.register(&self.module.short_name);
        let name = format!("{}:{}", prefix, self.session.naming.root_marker);
        let fields = self
            .roots
            .iter()
            .enumerate()
            .map(|(n, (root_name, type_ref))| Field::structured(n as u32 + 1, root_name.clone(), type_ref.clone(), vec![], ""))
            .collect::<Vec<_>>();
        let kind = if fields.len() == 1 {
            BaseKind::Record
        } else {
            BaseKind::Choice(ChoiceDiscipline::ExactlyOne)
        };
        Ok(Some(self.session.add(make_type(name, kind, vec![], "", fields))?))
    }

    fn local_type_name(&mut self, path: &[String]) -> Result<TypeName> {
        let owner = self.module.short_name.clone();
        self.type_name(&owner, path)
    }

    fn type_name(&mut self, owner_key: &str, path: &[String]) -> Result<TypeName> {
        let sys = self.session.naming.separator()?;
        if let Some(bad) = path.iter().find(|s| s.is_empty() || s.contains(sys)) {
            return Err(TranslateError::malformed(
                bad.as_str(),
                format!("empty or contains reserved separator '{}'", sys),
            ));
        }
        let prefix = self.session.registry.register(owner_key);
        Ok(format!("{}:{}", prefix, capitalize(&path.join(&sys.to_string()))))
    }

    fn kind_of(&self, e: &Element) -> Result<DefinitionKind> {
        DefinitionKind::from_tag(&e.name)
            .ok_or_else(|| TranslateError::unsupported(e.name.as_str(), "not a definition"))
    }

    fn required_attr<'e>(&self, e: &'e Element, attr: &str, path: &[String]) -> Result<&'e str> {
        e.attr(attr).ok_or_else(|| {
            TranslateError::unsupported(
                format!("{}/{}", path.join("/"), e.name),
                format!("missing '{}' attribute", attr),
            )
        })
    }

    fn unknown_datatype(&self, as_type: &str, path: &[String]) -> TranslateError {
        TranslateError::unsupported(path.join("/"), format!("unknown datatype '{}'", as_type))
    }
}

fn is_model_member(tag: &str) -> bool {
    matches!(
        tag,
        "assembly" | "field" | "define-assembly" | "define-field" | "choice" | "any"
    )
}

fn has_flags(e: &Element) -> bool {
    e.elements().any(|c| c.name == "flag" || c.name == "define-flag")
}

/// Description, else formal name
fn documentation(e: &Element) -> String {
    e.child_text("description")
        .or_else(|| e.child_text("formal-name"))
        .unwrap_or_default()
}

fn group_as(e: &Element) -> Option<String> {
    e.child("group-as").and_then(|g| g.attr("name")).map(str::to_string)
}

fn occurrence(e: &Element) -> Vec<TypeOption> {
    let min = match e.attr("required") {
        Some("yes") => 1,
        Some(_) => 0,
        None => e.attr("min-occurs").and_then(|v| v.parse().ok()).unwrap_or(0),
    };
    let max = match e.attr("max-occurs") {
        Some("unbounded") => 0,
        Some(v) => v.parse().unwrap_or(1),
        None => 1,
    };
    let mut opts = vec![TypeOption::MinCount(min), TypeOption::MaxCount(max)];
    if let Some(default) = e.attr("default") {
        opts.push(TypeOption::Default(default.to_string()));
    }
    opts
}

/// Items of a closed `constraint/allowed-values` list
fn allowed_values(e: &Element) -> Option<Vec<Field>> {
    let allowed = e.child("constraint")?.child("allowed-values")?;
    if allowed.attr("allow-other") == Some("yes") {
        return None;
    }
    let items: Vec<Field> = allowed
        .elements()
        .filter(|v| v.name == "enum")
        .filter_map(|v| v.attr("value").map(|value| (value, v.text())))
        .enumerate()
        .map(|(n, (value, desc))| Field::item(n as u32 + 1, value, desc))
        .collect();
    (!items.is_empty()).then_some(items)
}
