use serde::{Deserialize, Serialize};

use crate::feedback::FormatCase;
use crate::resolve::SnippetRef;

/// One tracked declaration or statement reported by the execution engine.
///
/// Ids are stable for the life of a session. Start-up entries use `s<n>`,
/// rejected input `e<n>`, everything else a plain number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    /// Declared name; empty for statements and anonymous expressions.
    #[serde(default)]
    pub name: String,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub source: String,
    /// Declared or computed type. For methods, the parameter types.
    #[serde(default)]
    pub type_name: String,
    /// Method signature such as `(int,String)void`.
    #[serde(default)]
    pub signature: Option<String>,
}

impl Entry {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl SnippetRef for Entry {
    fn id(&self) -> &str {
        &self.id
    }

    /// Only declarations match by name.
    fn name(&self) -> &str {
        if self.kind.is_declaration() {
            &self.name
        } else {
            ""
        }
    }

    fn source(&self) -> &str {
        &self.source
    }
}

/// The shape of a snippet, as far as transcript rendering cares.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    SingleTypeImport,
    TypeImportOnDemand,
    SingleStaticImport,
    StaticImportOnDemand,
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
    Method,
    /// `int x;`
    VarDeclaration,
    /// `int x = 1;`
    VarWithInitializer,
    /// A bare expression bound to a scratch variable such as `$1`.
    TempVarExpression,
    /// A bare reference to an existing variable.
    VarValue,
    Assignment,
    /// Any other expression; it has no scratch variable.
    OtherExpression,
    Statement,
    Erroneous,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleTypeImport => "single_type_import",
            Self::TypeImportOnDemand => "type_import_on_demand",
            Self::SingleStaticImport => "single_static_import",
            Self::StaticImportOnDemand => "static_import_on_demand",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Annotation => "annotation",
            Self::Record => "record",
            Self::Method => "method",
            Self::VarDeclaration => "var_declaration",
            Self::VarWithInitializer => "var_with_initializer",
            Self::TempVarExpression => "temp_var_expression",
            Self::VarValue => "var_value",
            Self::Assignment => "assignment",
            Self::OtherExpression => "other_expression",
            Self::Statement => "statement",
            Self::Erroneous => "erroneous",
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(
            self,
            Self::SingleTypeImport
                | Self::TypeImportOnDemand
                | Self::SingleStaticImport
                | Self::StaticImportOnDemand
        )
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Enum | Self::Annotation | Self::Record
        )
    }

    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            Self::VarDeclaration | Self::VarWithInitializer | Self::TempVarExpression
        )
    }

    /// Types, methods and variables: the kinds that bind a name.
    pub fn is_declaration(&self) -> bool {
        self.is_type() || self.is_variable() || *self == Self::Method
    }

    /// Keyword shown by `/types`.
    pub fn type_keyword(&self) -> Option<&'static str> {
        match self {
            Self::Class => Some("class"),
            Self::Interface => Some("interface"),
            Self::Enum => Some("enum"),
            Self::Annotation => Some("@interface"),
            Self::Record => Some("record"),
            _ => None,
        }
    }

    /// The selector case of this kind. Other expressions and erroneous
    /// input have none.
    pub fn format_case(&self) -> Option<FormatCase> {
        let case = match self {
            Self::SingleTypeImport
            | Self::TypeImportOnDemand
            | Self::SingleStaticImport
            | Self::StaticImportOnDemand => FormatCase::Import,
            Self::Class => FormatCase::Class,
            Self::Interface => FormatCase::Interface,
            Self::Enum => FormatCase::Enum,
            Self::Annotation => FormatCase::Annotation,
            Self::Record => FormatCase::Record,
            Self::Method => FormatCase::Method,
            Self::VarDeclaration => FormatCase::VarDecl,
            Self::VarWithInitializer => FormatCase::VarInit,
            Self::TempVarExpression => FormatCase::Expression,
            Self::VarValue => FormatCase::VarValue,
            Self::Assignment => FormatCase::Assignment,
            Self::Statement => FormatCase::Statement,
            Self::OtherExpression | Self::Erroneous => return None,
        };
        Some(case)
    }
}

/// Lifecycle status of an entry.
///
/// - `Valid`: compiled and usable
/// - `RecoverableDefined`: declared, but references something missing
/// - `RecoverableNotDefined`: references something missing and cannot be
///   declared yet
/// - `Dropped`, `Overwritten`: replaced or removed by later input
/// - `Rejected`: failed to compile
/// - `Nonexistent`: before the entry was first created
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Valid,
    RecoverableDefined,
    RecoverableNotDefined,
    Dropped,
    Overwritten,
    Rejected,
    Nonexistent,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::RecoverableDefined => "recoverable_defined",
            Self::RecoverableNotDefined => "recoverable_not_defined",
            Self::Dropped => "dropped",
            Self::Overwritten => "overwritten",
            Self::Rejected => "rejected",
            Self::Nonexistent => "nonexistent",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Valid | Self::RecoverableDefined | Self::RecoverableNotDefined
        )
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Valid | Self::RecoverableDefined)
    }
}

/// A compiler diagnostic. Positions are byte offsets into the entry's
/// source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub is_error: bool,
    pub message: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            is_error: true,
            message: message.into(),
            start: Some(start),
            end: Some(end),
        }
    }
}

/// A change in an entry's status reported by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnippetEvent {
    /// The entry, carrying its new status.
    pub entry: Entry,
    pub previous_status: EntryStatus,
    #[serde(default)]
    pub signature_changed: bool,
    /// Id of the entry whose change caused this update; `None` for the
    /// entry that was submitted.
    #[serde(default)]
    pub caused_by: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub unresolved: Vec<String>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    /// Exception text when evaluation threw.
    #[serde(default)]
    pub exception: Option<String>,
}

impl SnippetEvent {
    /// An event for a newly created entry.
    pub fn created(entry: Entry) -> Self {
        Self {
            entry,
            previous_status: EntryStatus::Nonexistent,
            signature_changed: true,
            caused_by: None,
            value: None,
            unresolved: Vec::new(),
            diagnostics: Vec::new(),
            exception: None,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.caused_by.is_none()
    }
}
