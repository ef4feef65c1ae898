//! Template rendering over a [`Mode`].

use std::sync::LazyLock;

use regex::Regex;

use super::{
    FeedbackError, FormatAction, FormatCase, FormatErrors, FormatResolve, FormatUnresolved,
    FormatWhen, Mode, Selector, TRUNCATION_FIELD,
};

static FIELD_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(.*?)\}").expect("field reference pattern is valid"));

const ELLIPSIS: &str = " ... ";

/// Truncation lengths at or below this are a hard cut with no ellipsis.
const MIN_ELLIPSIS_LENGTH: usize = 13;

/// The values bound to the positional arguments of an event's templates.
#[derive(Debug, Clone, Default)]
pub struct EventFields<'a> {
    pub name: &'a str,
    pub type_name: &'a str,
    pub value: Option<&'a str>,
    pub unresolved: &'a str,
    pub error_lines: &'a [String],
}

impl Mode {
    /// Renders `field` for an event classified as `selector`.
    ///
    /// Yields an empty string when no setting of the field covers the
    /// selector. `{other}` references are rendered recursively with the same
    /// selector.
    pub fn render(&self, field: &str, selector: &Selector) -> Result<String, FeedbackError> {
        let mut stack = Vec::new();
        self.render_guarded(field, selector, &mut stack)
    }

    fn render_guarded(
        &self,
        field: &str,
        selector: &Selector,
        stack: &mut Vec<String>,
    ) -> Result<String, FeedbackError> {
        if stack.iter().any(|f| f == field) {
            return Err(FeedbackError::TemplateCycleDetected {
                field: field.to_string(),
            });
        }

        let Some(template) = self
            .settings(field)
            .iter()
            .rev()
            .find(|s| s.selector.covers(selector))
            .map(|s| s.template.as_str())
        else {
            return Ok(String::new());
        };
        if template.is_empty() {
            return Ok(String::new());
        }

        stack.push(field.to_string());
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for caps in FIELD_REFERENCE.captures_iter(template) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&self.render_guarded(inner.as_str(), selector, stack)?);
            last = whole.end();
        }
        rendered.push_str(&template[last..]);
        stack.pop();

        Ok(rendered)
    }

    /// Applies the truncation length configured for `selector` to `value`.
    ///
    /// Lengths are counted in characters.
    pub fn truncate(&self, value: &str, selector: &Selector) -> Result<String, FeedbackError> {
        let configured = self.render(TRUNCATION_FIELD, selector)?;
        let configured = configured.trim();
        if configured.is_empty() {
            return Ok(value.to_string());
        }
        let Ok(limit) = configured.parse::<usize>() else {
            tracing::warn!(length = configured, mode = self.name(), "Ignoring unparsable truncation length");
            return Ok(value.to_string());
        };
        Ok(truncate_to(value, limit))
    }

    /// Truncates a variable value the way a newly added variable is shown.
    pub fn truncate_var_value(&self, value: &str) -> Result<String, FeedbackError> {
        let selector = Selector::of(
            FormatCase::VarValue,
            FormatAction::Added,
            FormatWhen::Primary,
            FormatResolve::Ok,
            FormatUnresolved::Unresolved0,
            FormatErrors::Error0,
        );
        self.truncate(value, &selector)
    }

    /// Renders `field` for an event, binding its positional arguments.
    ///
    /// Error lines are each rendered through the `errorline` field and
    /// concatenated into the `errors` argument.
    pub fn render_event(
        &self,
        field: &str,
        selector: &Selector,
        fields: &EventFields<'_>,
    ) -> Result<String, FeedbackError> {
        let value = match fields.value {
            Some(v) => self.truncate(v, selector)?,
            None => String::new(),
        };

        let mut errors = String::new();
        if !fields.error_lines.is_empty() {
            let errorline = self.render("errorline", selector)?;
            for line in fields.error_lines {
                errors.push_str(&substitute(
                    &errorline,
                    &[
                        fields.name,
                        fields.type_name,
                        &value,
                        fields.unresolved,
                        "*cannot-use-errors-here*",
                        line,
                    ],
                ));
            }
        }

        let template = self.render(field, selector)?;
        Ok(substitute(
            &template,
            &[
                fields.name,
                fields.type_name,
                &value,
                fields.unresolved,
                &errors,
                "*cannot-use-err-here*",
            ],
        ))
    }

    /// Renders the `display` field for an event.
    pub fn display(
        &self,
        selector: &Selector,
        fields: &EventFields<'_>,
    ) -> Result<String, FeedbackError> {
        self.render_event("display", selector, fields)
    }
}

fn truncate_to(value: &str, limit: usize) -> String {
    let len = value.chars().count();
    if len <= limit {
        return value.to_string();
    }
    if limit <= MIN_ELLIPSIS_LENGTH {
        return value.chars().take(limit).collect();
    }
    let end_len = limit / 3;
    let start_len = limit - ELLIPSIS.len() - end_len;
    let mut out: String = value.chars().take(start_len).collect();
    out.push_str(ELLIPSIS);
    out.extend(value.chars().skip(len - end_len));
    out
}

/// Expands `%1$s`..`%6$s`, `%n` and `%%`. Anything else after `%` is
/// copied as is.
fn substitute(template: &str, args: &[&str; 6]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(d @ '1'..='6') => {
                let mut lookahead = chars.clone();
                lookahead.next();
                if lookahead.next() == Some('$') && lookahead.next() == Some('s') {
                    chars = lookahead;
                    let index = d as usize - '1' as usize;
                    out.push_str(args[index]);
                } else {
                    out.push('%');
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Selector {
        Selector::of(
            FormatCase::VarInit,
            FormatAction::Added,
            FormatWhen::Primary,
            FormatResolve::Ok,
            FormatUnresolved::Unresolved0,
            FormatErrors::Error0,
        )
    }

    #[test]
    fn test_render_missing_field_is_empty() {
        let mode = Mode::new("m", true);
        assert_eq!(mode.render("nothing", &event()).unwrap(), "");
    }

    #[test]
    fn test_later_covering_setting_wins() {
        let mut mode = Mode::new("m", true);
        mode.set("display", "general", Selector::ALWAYS);
        mode.set(
            "display",
            "specific",
            Selector::new(&[FormatCase::VarInit], &[FormatAction::Added], &[], &[], &[], &[]),
        );
        assert_eq!(mode.render("display", &event()).unwrap(), "specific");
    }

    #[test]
    fn test_non_covering_setting_is_skipped() {
        let mut mode = Mode::new("m", true);
        mode.set("display", "general", Selector::ALWAYS);
        mode.set("display", "method", Selector::parse("method").unwrap());
        assert_eq!(mode.render("display", &event()).unwrap(), "general");
    }

    #[test]
    fn test_references_render_recursively() {
        let mut mode = Mode::new("m", true);
        mode.set("action", "created", Selector::ALWAYS);
        mode.set("display", "{pre}{action} {name}{post}", Selector::ALWAYS);
        assert_eq!(
            mode.render("display", &event()).unwrap(),
            "|  created %1$s%n"
        );
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut mode = Mode::new("m", true);
        mode.set("a", "x{b}", Selector::ALWAYS);
        mode.set("b", "y{a}", Selector::ALWAYS);
        assert_eq!(
            mode.render("a", &event()).unwrap_err(),
            FeedbackError::TemplateCycleDetected {
                field: "a".to_string()
            }
        );
    }

    #[test]
    fn test_repeated_reference_is_not_a_cycle() {
        let mut mode = Mode::new("m", true);
        mode.set("display", "{pre}{pre}", Selector::ALWAYS);
        assert_eq!(mode.render("display", &event()).unwrap(), "|  |  ");
    }

    #[test]
    fn test_truncate_hard_cut() {
        let value = "abcdefghijklmnopqrstuvwxyz";
        let cut = truncate_to(value, 13);
        assert_eq!(cut, "abcdefghijklm");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        let value = "0123456789abcdefghijklmnopqrst";
        let cut = truncate_to(value, 20);
        assert_eq!(cut.chars().count(), 20);
        assert_eq!(cut, "012345678 ... opqrst");
    }

    #[test]
    fn test_truncate_without_setting_keeps_value() {
        let mode = Mode::new("m", true);
        let value = "x".repeat(500);
        assert_eq!(mode.truncate(&value, &event()).unwrap(), value);
    }

    #[test]
    fn test_truncate_var_value_uses_varvalue_setting() {
        let mut mode = Mode::new("m", true);
        mode.set(TRUNCATION_FIELD, "80", Selector::ALWAYS);
        mode.set(TRUNCATION_FIELD, "10", Selector::parse("varvalue").unwrap());
        assert_eq!(mode.truncate_var_value("abcdefghijklmnop").unwrap(), "abcdefghij");
    }

    #[test]
    fn test_substitute_positional() {
        let args = ["n", "t", "v", "u", "e", "r"];
        assert_eq!(substitute("%1$s:%2$s=%3$s%n", &args), "n:t=v\n");
        assert_eq!(substitute("100%% %x %7$s", &args), "100% %x %7$s");
    }

    #[test]
    fn test_render_event_binds_arguments() {
        let mut mode = Mode::new("m", true);
        mode.set("display", "{pre}{name} : {type} = {value}{post}", Selector::ALWAYS);
        let fields = EventFields {
            name: "x",
            type_name: "int",
            value: Some("42"),
            ..Default::default()
        };
        assert_eq!(mode.display(&event(), &fields).unwrap(), "|  x : int = 42\n");
    }

    #[test]
    fn test_render_event_builds_error_lines() {
        let mut mode = Mode::new("m", true);
        mode.set("display", "{errors}", Selector::ALWAYS);
        let lines = vec!["first".to_string(), "second".to_string()];
        let fields = EventFields {
            error_lines: &lines,
            ..Default::default()
        };
        assert_eq!(
            mode.display(&event(), &fields).unwrap(),
            "    first\n    second\n"
        );
    }
}
