use indexmap::IndexMap;

use super::{FeedbackError, Selector};

/// Separates the parts of an encoded mode. Not expected in user templates.
pub const RECORD_SEPARATOR: char = '\u{241E}';

/// Private field holding the truncation length settings.
pub const TRUNCATION_FIELD: &str = "<truncation>";

const END_OF_MODE: &str = "***";

/// Built-in fields every new mode starts with. The first six bind the
/// positional arguments of a rendered event.
const DEFAULT_FIELDS: &[(&str, &str)] = &[
    ("name", "%1$s"),
    ("type", "%2$s"),
    ("value", "%3$s"),
    ("unresolved", "%4$s"),
    ("errors", "%5$s"),
    ("err", "%6$s"),
    ("errorline", "    {err}%n"),
    ("pre", "|  "),
    ("post", "%n"),
    ("errorpre", "|  "),
    ("errorpost", "%n"),
];

/// One template guarded by a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub template: String,
    pub selector: Selector,
}

/// A named set of field templates.
///
/// Settings within a field are kept in insertion order; rendering prefers
/// the most recent setting that covers the event.
#[derive(Debug, Clone)]
pub struct Mode {
    name: String,
    command_fluff: bool,
    read_only: bool,
    by_field: IndexMap<String, Vec<Setting>>,
}

impl Mode {
    /// A fresh mode holding only the built-in field defaults.
    pub fn new(name: impl Into<String>, command_fluff: bool) -> Self {
        let mut mode = Self::bare(name.into(), command_fluff);
        for (field, template) in DEFAULT_FIELDS {
            mode.set(field, *template, Selector::ALWAYS);
        }
        mode
    }

    /// A new mode with every setting of `source`.
    pub fn copy_of(name: impl Into<String>, source: &Mode, command_fluff: bool) -> Self {
        Self {
            name: name.into(),
            command_fluff,
            read_only: false,
            by_field: source.by_field.clone(),
        }
    }

    fn bare(name: String, command_fluff: bool) -> Self {
        Self {
            name,
            command_fluff,
            read_only: false,
            by_field: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether confirmation messages are shown for commands.
    pub fn command_fluff(&self) -> bool {
        self.command_fluff
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn mark_read_only(&mut self) {
        self.read_only = true;
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.by_field.contains_key(field)
    }

    pub fn settings(&self, field: &str) -> &[Setting] {
        self.by_field.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields in the order they were first set.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[Setting])> {
        self.by_field
            .iter()
            .map(|(field, settings)| (field.as_str(), settings.as_slice()))
    }

    /// Adds a setting, dropping any earlier setting on the same field whose
    /// selector is included in the new one.
    ///
    /// Does not check the read-only flag; [`super::ModeStore::set_field`]
    /// does.
    pub fn set(&mut self, field: &str, template: impl Into<String>, selector: Selector) {
        let settings = self.by_field.entry(field.to_string()).or_default();
        settings.retain(|s| !s.selector.included_in(&selector));
        settings.push(Setting {
            template: template.into(),
            selector,
        });
    }

    /// Flat encoding used to persist retained modes.
    ///
    /// Layout: name, fluff flag, then per field `field ( sel tmpl ... )`,
    /// closed by `***`, every part followed by [`RECORD_SEPARATOR`].
    pub fn encode(&self) -> String {
        let mut parts: Vec<String> = vec![self.name.clone(), self.command_fluff.to_string()];
        for (field, settings) in &self.by_field {
            parts.push(field.clone());
            parts.push("(".to_string());
            for setting in settings {
                parts.push(setting.selector.to_string());
                parts.push(setting.template.clone());
            }
            parts.push(")".to_string());
        }
        parts.push(END_OF_MODE.to_string());

        let mut encoded = String::new();
        for part in parts {
            encoded.push_str(&part);
            encoded.push(RECORD_SEPARATOR);
        }
        encoded
    }

    /// Decodes a blob of concatenated encoded modes.
    ///
    /// All or nothing: any malformed record fails the whole batch.
    pub fn decode_all(encoded: &str) -> Result<Vec<Mode>, FeedbackError> {
        let mut parts = Parts::new(encoded);
        let mut modes = Vec::new();
        while !parts.is_empty() {
            modes.push(Self::decode_one(&mut parts)?);
        }
        Ok(modes)
    }

    fn decode_one(parts: &mut Parts<'_>) -> Result<Mode, FeedbackError> {
        let name = parts.next()?;
        let command_fluff = match parts.next()? {
            "true" => true,
            "false" => false,
            other => return Err(corrupt(format!("bad command flag '{}'", other))),
        };
        let mut mode = Self::bare(name.to_string(), command_fluff);

        loop {
            let field = parts.next()?;
            if field == END_OF_MODE {
                return Ok(mode);
            }
            if parts.next()? != "(" {
                return Err(corrupt(format!("missing '(' after field '{}'", field)));
            }
            let mut settings = Vec::new();
            loop {
                let selector_text = parts.next()?;
                if selector_text == ")" {
                    break;
                }
                let template = parts.next()?;
                settings.push(Setting {
                    template: template.to_string(),
                    selector: decode_selector(selector_text)?,
                });
            }
            mode.by_field.insert(field.to_string(), settings);
        }
    }
}

/// Modes compare by name, fluff and settings; the read-only flag is not
/// part of a mode's content.
impl PartialEq for Mode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.command_fluff == other.command_fluff
            && self.by_field == other.by_field
    }
}

impl Eq for Mode {}

struct Parts<'a> {
    rest: &'a str,
}

impl<'a> Parts<'a> {
    fn new(encoded: &'a str) -> Self {
        Self { rest: encoded }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn next(&mut self) -> Result<&'a str, FeedbackError> {
        let end = self
            .rest
            .find(RECORD_SEPARATOR)
            .ok_or_else(|| corrupt("truncated record".to_string()))?;
        let part = &self.rest[..end];
        self.rest = &self.rest[end + RECORD_SEPARATOR.len_utf8()..];
        Ok(part)
    }
}

/// Selector text, or the decimal bit vector written by older versions.
fn decode_selector(text: &str) -> Result<Selector, FeedbackError> {
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .ok()
            .and_then(Selector::from_bits)
            .ok_or_else(|| corrupt(format!("bad selector bits '{}'", text)));
    }
    Selector::parse(text).map_err(|e| corrupt(e.to_string()))
}

fn corrupt(reason: String) -> FeedbackError {
    FeedbackError::ModeDecodeCorruption(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{FormatAction, FormatCase};

    fn varinit() -> Selector {
        Selector::new(&[FormatCase::VarInit], &[], &[], &[], &[], &[])
    }

    #[test]
    fn test_new_mode_has_defaults() {
        let mode = Mode::new("mine", true);
        assert_eq!(mode.settings("name")[0].template, "%1$s");
        assert_eq!(mode.settings("pre")[0].template, "|  ");
        assert!(mode.settings("display").is_empty());
        assert!(!mode.is_read_only());
    }

    #[test]
    fn test_set_prunes_included_settings() {
        let mut mode = Mode::new("m", true);
        mode.set("display", "narrow", varinit());
        mode.set("display", "wide", Selector::ALWAYS);
        let settings = mode.settings("display");
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].template, "wide");
    }

    #[test]
    fn test_set_keeps_partial_overlap() {
        let mut mode = Mode::new("m", true);
        let added = Selector::new(&[], &[FormatAction::Added], &[], &[], &[], &[]);
        mode.set("display", "added", added);
        mode.set("display", "varinit", varinit());
        assert_eq!(mode.settings("display").len(), 2);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut mode = Mode::new("round", false);
        mode.set("display", "{pre}hello{post}", varinit());
        mode.set(TRUNCATION_FIELD, "40", Selector::ALWAYS);
        let decoded = Mode::decode_all(&mode.encode()).unwrap();
        assert_eq!(decoded, vec![mode]);
    }

    #[test]
    fn test_decode_concatenated_modes() {
        let a = Mode::new("a", true);
        let b = Mode::new("b", false);
        let blob = format!("{}{}", a.encode(), b.encode());
        let decoded = Mode::decode_all(&blob).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[1].name(), "b");
    }

    #[test]
    fn test_decode_truncated_blob_fails() {
        let blob = Mode::new("a", true).encode();
        let cut: String = blob.chars().take(blob.chars().count() / 2).collect();
        assert!(matches!(
            Mode::decode_all(&cut),
            Err(FeedbackError::ModeDecodeCorruption(_))
        ));
    }

    #[test]
    fn test_decode_missing_end_of_mode_fails() {
        let mut mode = Mode::new("a", true);
        mode.set("display", "{name}", varinit());
        let blob = mode.encode();
        let terminator = format!("{}{}", END_OF_MODE, RECORD_SEPARATOR);
        let cut = blob.strip_suffix(&terminator).unwrap();
        assert!(matches!(
            Mode::decode_all(cut),
            Err(FeedbackError::ModeDecodeCorruption(_))
        ));
    }

    #[test]
    fn test_decode_legacy_bits() {
        let sel = varinit();
        let blob = format!(
            "old{sep}true{sep}display{sep}({sep}{bits}{sep}x{sep}){sep}***{sep}",
            sep = RECORD_SEPARATOR,
            bits = sel.bits()
        );
        let modes = Mode::decode_all(&blob).unwrap();
        assert_eq!(modes[0].settings("display")[0].selector, sel);
    }

    #[test]
    fn test_decode_empty_blob() {
        assert!(Mode::decode_all("").unwrap().is_empty());
    }
}
