//! Identifier Resolution
//!
//! Turns encoded `$id` / `$ref` strings into canonical type names:
//!
//! - `#assembly_oscal-ap_assessment-plan` → `n01:Assessment-plan`
//! - `#/definitions/Widget` → `n02:Widget` (shared namespace)
//! - anonymous nested types → owner name plus the field path, e.g.
//!   `n01:Catalog.groups.parts`

pub mod identifier;
pub mod registry;

pub use identifier::{ParsedIdentifier, DEFINITIONS_MARKER};
pub use registry::NamespaceRegistry;

use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, TranslateError};
use crate::ir::TypeName;

/// Upper-case the first character, leave the rest unchanged
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split `prefix:Local` into its parts
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once(':')
}

/// Per-document resolver. Knows the document's definitions so pointers can be
/// checked, and memoizes every name it builds.
#[derive(Debug, Clone)]
pub struct IdentifierResolver {
    sys: char,
    definitions: BTreeSet<String>,
    /// `$id` -> definition key
    ids: HashMap<String, String>,
    memo: HashMap<(String, Vec<String>), TypeName>,
}

impl IdentifierResolver {
    pub fn new(sys: char) -> Self {
        Self {
            sys,
            definitions: BTreeSet::new(),
            ids: HashMap::new(),
            memo: HashMap::new(),
        }
    }

    /// Declare a definition of the current document
    pub fn add_definition(&mut self, key: &str, id: Option<&str>) {
        self.definitions.insert(key.to_string());
        if let Some(id) = id {
            self.ids.insert(id.to_string(), key.to_string());
        }
    }

    pub fn has_definition(&self, key: &str) -> bool {
        self.definitions.contains(key)
    }

    /// Key of the definition an identifier points at, if it is in this document
    pub fn definition_key(&self, identifier: &str) -> Option<&str> {
        if let Some(key) = self.ids.get(identifier) {
            return Some(key);
        }
        match ParsedIdentifier::parse(identifier) {
            ParsedIdentifier::Pointer { local } => self.definitions.get(&local).map(String::as_str),
            _ => None,
        }
    }

    /// Resolve `key` (an encoded identifier, or empty) plus an anonymous path
    /// into a canonical type name.
    pub fn resolve(
        &mut self,
        registry: &mut NamespaceRegistry,
        default_name: &str,
        key: &str,
        path: &[String],
    ) -> Result<TypeName> {
        let key = if key.is_empty() {
            format!("{}{}", DEFINITIONS_MARKER, default_name)
        } else {
            key.to_string()
        };
        let memo_key = (key, path.to_vec());
        if let Some(name) = self.memo.get(&memo_key) {
            return Ok(name.clone());
        }

        let owner = self.resolve_owner(registry, &memo_key.0)?;
        let name = if path.is_empty() {
            owner
        } else {
            let sys = self.sys.to_string();
            format!("{}{}{}", owner, sys, path.join(&sys))
        };
        self.memo.insert(memo_key, name.clone());
        Ok(name)
    }

    fn resolve_owner(&self, registry: &mut NamespaceRegistry, key: &str) -> Result<TypeName> {
        match ParsedIdentifier::parse(key) {
            ParsedIdentifier::Qualified { namespace, local } => {
                self.check_local(key, &local)?;
                let prefix = registry.register(&namespace);
                Ok(format!("{}:{}", prefix, capitalize(&local)))
            }
            ParsedIdentifier::Pointer { local } => {
                if !self.definitions.contains(&local) {
                    return Err(TranslateError::malformed(key, "no such definition"));
                }
                self.check_local(key, &local)?;
                let prefix = registry.register("");
                Ok(format!("{}:{}", prefix, local))
            }
            ParsedIdentifier::Raw { value } => match self.ids.get(&value) {
                Some(def_key) => {
                    self.check_local(key, def_key)?;
                    let prefix = registry.register("");
                    Ok(format!("{}:{}", prefix, capitalize(def_key)))
                }
                None => Err(TranslateError::malformed(key, "not a qualified name, pointer or known $id")),
            },
        }
    }

    fn check_local(&self, key: &str, local: &str) -> Result<()> {
        if local.is_empty() {
            return Err(TranslateError::malformed(key, "empty local name"));
        }
        if local.contains(self.sys) {
            return Err(TranslateError::malformed(
                key,
                format!("local name contains reserved separator '{}'", self.sys),
            ));
        }
        Ok(())
    }
}
