//! The selector space: six closed axes packed into a 30-bit set.

use std::fmt;
use std::str::FromStr;

use super::FeedbackError;

/// One of the six classification axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Case,
    Action,
    When,
    Resolve,
    Unresolved,
    Errors,
}

impl SelectorKind {
    /// Axes in the order used for canonical text.
    pub const ALL: [SelectorKind; 6] = [
        Self::Case,
        Self::Action,
        Self::When,
        Self::Resolve,
        Self::Unresolved,
        Self::Errors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Action => "action",
            Self::When => "when",
            Self::Resolve => "resolve",
            Self::Unresolved => "unresolved",
            Self::Errors => "errors",
        }
    }

    /// Number of enumerators on this axis, which is also its field width.
    pub const fn width(self) -> u32 {
        match self {
            Self::Case => 13,
            Self::Action => 6,
            Self::When => 2,
            Self::Resolve => 3,
            Self::Unresolved => 3,
            Self::Errors => 3,
        }
    }

    const fn offset(self) -> u32 {
        match self {
            Self::Errors => 0,
            Self::Unresolved => 3,
            Self::Resolve => 6,
            Self::When => 9,
            Self::Action => 11,
            Self::Case => 17,
        }
    }

    const fn mask(self) -> u32 {
        ((1 << self.width()) - 1) << self.offset()
    }

    fn value_names(self) -> Vec<&'static str> {
        match self {
            Self::Case => FormatCase::ALL.iter().map(|v| v.as_str()).collect(),
            Self::Action => FormatAction::ALL.iter().map(|v| v.as_str()).collect(),
            Self::When => FormatWhen::ALL.iter().map(|v| v.as_str()).collect(),
            Self::Resolve => FormatResolve::ALL.iter().map(|v| v.as_str()).collect(),
            Self::Unresolved => FormatUnresolved::ALL.iter().map(|v| v.as_str()).collect(),
            Self::Errors => FormatErrors::ALL.iter().map(|v| v.as_str()).collect(),
        }
    }
}

/// An enumerator of one axis.
pub trait AxisValue: Copy {
    const KIND: SelectorKind;

    fn ordinal(self) -> u32;

    fn bit(self) -> u32 {
        1 << (Self::KIND.offset() + self.ordinal())
    }
}

macro_rules! selector_axis {
    ($(#[$meta:meta])* $name:ident : $kind:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl AxisValue for $name {
            const KIND: SelectorKind = SelectorKind::$kind;

            fn ordinal(self) -> u32 {
                self as u32
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

selector_axis! {
    /// What kind of snippet the event is about.
    FormatCase: Case {
        Import => "import",
        Class => "class",
        Interface => "interface",
        Enum => "enum",
        Annotation => "annotation",
        Record => "record",
        Method => "method",
        VarDecl => "vardecl",
        VarInit => "varinit",
        Expression => "expression",
        VarValue => "varvalue",
        Assignment => "assignment",
        Statement => "statement",
    }
}

selector_axis! {
    /// What happened to the snippet.
    FormatAction: Action {
        Added => "added",
        Modified => "modified",
        Replaced => "replaced",
        Overwrote => "overwrote",
        Dropped => "dropped",
        Used => "used",
    }
}

selector_axis! {
    /// Whether the snippet was entered directly or updated as a dependent.
    FormatWhen: When {
        Primary => "primary",
        Update => "update",
    }
}

selector_axis! {
    FormatResolve: Resolve {
        Ok => "ok",
        Defined => "defined",
        NotDefined => "notdefined",
    }
}

selector_axis! {
    /// Count of unresolved references, bucketed.
    FormatUnresolved: Unresolved {
        Unresolved0 => "unresolved0",
        Unresolved1 => "unresolved1",
        Unresolved2 => "unresolved2",
    }
}

selector_axis! {
    /// Count of error diagnostics, bucketed.
    FormatErrors: Errors {
        Error0 => "error0",
        Error1 => "error1",
        Error2 => "error2",
    }
}

impl FormatUnresolved {
    pub fn bucket(count: usize) -> Self {
        match count {
            0 => Self::Unresolved0,
            1 => Self::Unresolved1,
            _ => Self::Unresolved2,
        }
    }
}

impl FormatErrors {
    pub fn bucket(count: usize) -> Self {
        match count {
            0 => Self::Error0,
            1 => Self::Error1,
            _ => Self::Error2,
        }
    }
}

/// A named enumerator from any axis, as it appears in selector text.
#[derive(Debug, Clone, Copy)]
enum AnyValue {
    Case(FormatCase),
    Action(FormatAction),
    When(FormatWhen),
    Resolve(FormatResolve),
    Unresolved(FormatUnresolved),
    Errors(FormatErrors),
}

impl AnyValue {
    fn lookup(name: &str) -> Option<Self> {
        FormatCase::from_str(name)
            .map(Self::Case)
            .or_else(|| FormatAction::from_str(name).map(Self::Action))
            .or_else(|| FormatWhen::from_str(name).map(Self::When))
            .or_else(|| FormatResolve::from_str(name).map(Self::Resolve))
            .or_else(|| FormatUnresolved::from_str(name).map(Self::Unresolved))
            .or_else(|| FormatErrors::from_str(name).map(Self::Errors))
    }

    fn kind(self) -> SelectorKind {
        match self {
            Self::Case(_) => SelectorKind::Case,
            Self::Action(_) => SelectorKind::Action,
            Self::When(_) => SelectorKind::When,
            Self::Resolve(_) => SelectorKind::Resolve,
            Self::Unresolved(_) => SelectorKind::Unresolved,
            Self::Errors(_) => SelectorKind::Errors,
        }
    }

    fn bit(self) -> u32 {
        match self {
            Self::Case(v) => v.bit(),
            Self::Action(v) => v.bit(),
            Self::When(v) => v.bit(),
            Self::Resolve(v) => v.bit(),
            Self::Unresolved(v) => v.bit(),
            Self::Errors(v) => v.bit(),
        }
    }
}

/// A set of allowed enumerators on each of the six axes.
///
/// An axis with no explicit choice allows every enumerator. Equality is
/// equality of the underlying bit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector {
    bits: u32,
}

impl Selector {
    /// Total width of the packed representation.
    pub const BIT_WIDTH: u32 = 30;

    /// Every axis allows everything.
    pub const ALWAYS: Selector = Selector {
        bits: (1 << Self::BIT_WIDTH) - 1,
    };

    /// Builds a selector from explicit per-axis subsets. An empty subset
    /// means "any" for that axis.
    pub fn new(
        cases: &[FormatCase],
        actions: &[FormatAction],
        whens: &[FormatWhen],
        resolves: &[FormatResolve],
        unresolved: &[FormatUnresolved],
        errors: &[FormatErrors],
    ) -> Self {
        Self {
            bits: axis_bits(cases)
                | axis_bits(actions)
                | axis_bits(whens)
                | axis_bits(resolves)
                | axis_bits(unresolved)
                | axis_bits(errors),
        }
    }

    /// The fully specified selector of a single event.
    pub fn of(
        case: FormatCase,
        action: FormatAction,
        when: FormatWhen,
        resolve: FormatResolve,
        unresolved: FormatUnresolved,
        errors: FormatErrors,
    ) -> Self {
        Self {
            bits: case.bit()
                | action.bit()
                | when.bit()
                | resolve.bit()
                | unresolved.bit()
                | errors.bit(),
        }
    }

    /// Rebuilds a selector from its packed form. Rejects vectors with bits
    /// outside the 30-bit space or with an empty axis.
    pub fn from_bits(bits: u64) -> Option<Self> {
        let bits = u32::try_from(bits).ok()?;
        if bits & !Self::ALWAYS.bits != 0 {
            return None;
        }
        SelectorKind::ALL
            .iter()
            .all(|kind| bits & kind.mask() != 0)
            .then_some(Self { bits })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// True when every enumerator `other` allows is also allowed here.
    pub fn covers(&self, other: &Selector) -> bool {
        self.bits & other.bits == other.bits
    }

    pub fn included_in(&self, other: &Selector) -> bool {
        self.bits & !other.bits == 0
    }

    /// True when the given axis allows every enumerator.
    pub fn is_any(&self, kind: SelectorKind) -> bool {
        self.bits & kind.mask() == kind.mask()
    }

    /// Enumerator names allowed on one axis, in declaration order.
    pub fn names(&self, kind: SelectorKind) -> Vec<&'static str> {
        let field = (self.bits & kind.mask()) >> kind.offset();
        kind.value_names()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| field & (1 << i) != 0)
            .map(|(_, name)| name)
            .collect()
    }

    /// Parses selector text such as `added,modified-varinit-primary`.
    ///
    /// Sections are separated by `-` and values within a section by `,`.
    /// All values in one section must belong to the same axis and an axis
    /// may appear in only one section.
    pub fn parse(text: &str) -> Result<Self, FeedbackError> {
        let mut chosen = 0u32;
        let mut seen: Vec<SelectorKind> = Vec::new();

        for section in text.split('-') {
            let mut section_kind: Option<SelectorKind> = None;
            for token in section.split(',').filter(|t| !t.is_empty()) {
                let value =
                    AnyValue::lookup(token).ok_or_else(|| FeedbackError::InvalidSelectorSyntax {
                        token: token.to_string(),
                        section: section.to_string(),
                    })?;
                let kind = value.kind();
                match section_kind {
                    None if seen.contains(&kind) => {
                        return Err(FeedbackError::MultipleSectionsForAxis {
                            token: token.to_string(),
                            section: section.to_string(),
                        });
                    }
                    None => {
                        seen.push(kind);
                        section_kind = Some(kind);
                    }
                    Some(current) if current != kind => {
                        return Err(FeedbackError::MixedAxisKinds {
                            token: token.to_string(),
                            section: section.to_string(),
                        });
                    }
                    Some(_) => {}
                }
                chosen |= value.bit();
            }
        }

        let bits = SelectorKind::ALL.iter().fold(chosen, |bits, kind| {
            if bits & kind.mask() == 0 {
                bits | kind.mask()
            } else {
                bits
            }
        });
        Ok(Self { bits })
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::ALWAYS
    }
}

impl FromStr for Selector {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical text: values joined by `,`, axes by `-`, "any" axes omitted.
/// [`Selector::ALWAYS`] renders as the empty string.
impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections: Vec<String> = SelectorKind::ALL
            .iter()
            .filter(|kind| !self.is_any(**kind))
            .map(|kind| self.names(*kind).join(","))
            .collect();
        f.write_str(&sections.join("-"))
    }
}

fn axis_bits<V: AxisValue>(values: &[V]) -> u32 {
    if values.is_empty() {
        V::KIND.mask()
    } else {
        values.iter().fold(0, |bits, v| bits | v.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varinit_added() -> Selector {
        Selector::new(
            &[FormatCase::VarInit],
            &[FormatAction::Added],
            &[],
            &[],
            &[],
            &[],
        )
    }

    #[test]
    fn test_axis_fields_fill_thirty_bits() {
        let total: u32 = SelectorKind::ALL.iter().map(|k| k.width()).sum();
        assert_eq!(total, Selector::BIT_WIDTH);
        let union = SelectorKind::ALL.iter().fold(0, |acc, k| acc | k.mask());
        assert_eq!(union, Selector::ALWAYS.bits());
    }

    #[test]
    fn test_empty_axis_means_any() {
        let sel = Selector::new(&[], &[], &[], &[], &[], &[]);
        assert_eq!(sel, Selector::ALWAYS);
    }

    #[test]
    fn test_parse_groups_by_section() {
        let sel = Selector::parse("added,modified-varinit,vardecl-primary").unwrap();
        assert_eq!(sel.names(SelectorKind::Action), vec!["added", "modified"]);
        assert_eq!(sel.names(SelectorKind::Case), vec!["vardecl", "varinit"]);
        assert_eq!(sel.names(SelectorKind::When), vec!["primary"]);
        assert!(sel.is_any(SelectorKind::Resolve));
    }

    #[test]
    fn test_display_is_canonical() {
        let sel = Selector::parse("primary-modified,added-varinit").unwrap();
        assert_eq!(sel.to_string(), "varinit-added,modified-primary");
        assert_eq!(Selector::ALWAYS.to_string(), "");
        assert_eq!(Selector::parse("").unwrap(), Selector::ALWAYS);
    }

    #[test]
    fn test_parse_rejects_unknown_token() {
        let err = Selector::parse("varinit-bogus").unwrap_err();
        assert_eq!(
            err,
            FeedbackError::InvalidSelectorSyntax {
                token: "bogus".to_string(),
                section: "bogus".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_axis_in_two_sections() {
        let err = Selector::parse("added-varinit-modified").unwrap_err();
        assert!(matches!(err, FeedbackError::MultipleSectionsForAxis { .. }));
    }

    #[test]
    fn test_parse_rejects_mixed_section() {
        let err = Selector::parse("added,varinit").unwrap_err();
        assert!(matches!(err, FeedbackError::MixedAxisKinds { .. }));
    }

    #[test]
    fn test_covers_specific_selector() {
        let event = Selector::of(
            FormatCase::VarInit,
            FormatAction::Added,
            FormatWhen::Primary,
            FormatResolve::Ok,
            FormatUnresolved::Unresolved0,
            FormatErrors::Error0,
        );
        assert!(Selector::ALWAYS.covers(&event));
        assert!(varinit_added().covers(&event));
        assert!(event.included_in(&varinit_added()));
        assert!(!varinit_added().included_in(&event));
    }

    #[test]
    fn test_from_bits_round_trip() {
        let sel = varinit_added();
        assert_eq!(Selector::from_bits(sel.bits() as u64), Some(sel));
        assert_eq!(Selector::from_bits(0), None);
        assert_eq!(Selector::from_bits(1 << 31), None);
    }

    #[test]
    fn test_buckets() {
        assert_eq!(FormatUnresolved::bucket(0), FormatUnresolved::Unresolved0);
        assert_eq!(FormatUnresolved::bucket(5), FormatUnresolved::Unresolved2);
        assert_eq!(FormatErrors::bucket(1), FormatErrors::Error1);
    }
}
