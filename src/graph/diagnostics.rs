//! Diagnostics
//!
//! Non-fatal findings collected during translation, ordering and splitting.
//! Fatal conditions are `TranslateError`s; everything here is reported
//! alongside a successful result.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Graph ===
    /// Type references itself; the edge is pruned before ordering
    SelfLoopDetected,
    /// Multi-member reference cycle
    Cycle,
    /// Type not reachable from any root
    Unreferenced,
    /// Reference to a type absent from the table
    UndefinedReference,

    // === Naming ===
    /// Generated type name violates `$TypeName`
    InvalidTypeName,
    /// Field name violates `$FieldName`
    InvalidFieldName,
    /// Name longer than `$MaxString`
    NameTooLong,

    // === Walk ===
    /// Alias wrapper created for a node with both `$id` and `$ref`
    Alias,

    // === Packages ===
    /// Same local name defined in more than one package
    NonQualifiedCollision,
    /// Differing root markers in one namespace; first kept
    RootMarkerCollision,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfLoopDetected => "I001",
            Self::Cycle => "I002",
            Self::Alias => "I003",
            Self::NonQualifiedCollision => "I004",
            Self::RootMarkerCollision => "I005",
            Self::Unreferenced => "W001",
            Self::UndefinedReference => "W002",
            Self::InvalidTypeName => "W003",
            Self::InvalidFieldName => "W004",
            Self::NameTooLong => "W005",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::SelfLoopDetected
            | Self::Cycle
            | Self::Alias
            | Self::NonQualifiedCollision
            | Self::RootMarkerCollision => Severity::Info,

            Self::Unreferenced
            | Self::UndefinedReference
            | Self::InvalidTypeName
            | Self::InvalidFieldName
            | Self::NameTooLong => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Type or document the finding is about
    pub subject: String,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (related types, paths)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    pub fn self_loop(&mut self, type_name: &str) {
        self.push(DiagnosticItem::new(
            type_name,
            DiagnosticCode::SelfLoopDetected,
            "self-referential edge removed before ordering",
        ));
    }

    pub fn unreferenced(&mut self, type_name: &str) {
        self.push(DiagnosticItem::new(
            type_name,
            DiagnosticCode::Unreferenced,
            "type is not reachable from any root",
        ));
    }

    pub fn undefined_reference(&mut self, type_name: &str, target: &str) {
        self.push(DiagnosticItem::new(
            type_name,
            DiagnosticCode::UndefinedReference,
            format!("reference to '{}' is not defined", target),
        ));
    }

    pub fn cycle(&mut self, members: &[String]) {
        let subject = members.first().cloned().unwrap_or_default();
        self.push(
            DiagnosticItem::new(
                subject,
                DiagnosticCode::Cycle,
                format!("{} types form a reference cycle", members.len()),
            )
            .with_context(members.join(" -> ")),
        );
    }

    pub fn alias(&mut self, type_name: &str, target: &str) {
        self.push(DiagnosticItem::new(
            type_name,
            DiagnosticCode::Alias,
            format!("alias of '{}'", target),
        ));
    }

    pub fn non_qualified_collision(&mut self, local: &str, qualified: &[String]) {
        self.push(
            DiagnosticItem::new(
                local,
                DiagnosticCode::NonQualifiedCollision,
                format!("local name defined in {} packages", qualified.len()),
            )
            .with_context(qualified.join(", ")),
        );
    }

    pub fn root_marker_collision(&mut self, type_name: &str, definitions: usize) {
        self.push(DiagnosticItem::new(
            type_name,
            DiagnosticCode::RootMarkerCollision,
            format!("{} differing root markers; first kept", definitions),
        ));
    }

    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Warning)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Items with the given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Emit every item through `tracing`
    pub fn log(&self) {
        for item in &self.items {
            match item.severity() {
                Severity::Info => tracing::info!("{}", item),
                Severity::Warning => tracing::warn!("{}", item),
            }
        }
    }

    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if !self.is_empty() {
            output.push_str(&format!(
                "\n{} warning(s), {} info\n",
                self.warning_count(),
                self.len() - self.warning_count()
            ));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
