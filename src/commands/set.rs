//! `/set format|truncation|mode|feedback`.

use crate::feedback::{FeedbackError, Mode, ModeStore, Selector, TRUNCATION_FIELD};
use crate::matching::{match_name, PrefixMatch};
use crate::session::{Session, Transcript};

use super::{ArgTokenizer, CommandError};

/// The predefined modes, as `/set` commands.
const PREDEFINED_MODES: &str = include_str!("../feedback/startup.feedback");

const SUBCOMMANDS: &[&str] = &["format", "truncation", "feedback", "mode"];

pub(crate) const SET_HELP: &[&str] = &[
    "/set format <mode> <field> \"<format>\" <selector>...",
    "/set truncation <mode> <length> <selector>...",
    "/set mode <mode> [<old-mode>] -command|-quiet|-delete|-retain",
    "/set feedback [-retain] <mode>",
];

pub(crate) fn cmd_set(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let mut setter = Setter::new(&mut session.feedback, &mut session.out, args);
    let result = setter.run();
    let saves = setter.saves;

    if saves.modes {
        session.save_retained_modes();
    }
    if saves.feedback {
        session.save_retained_feedback();
    }
    result
}

/// Installs the read-only predefined modes into an empty store and makes
/// `normal` current.
pub fn install_predefined_modes(store: &mut ModeStore) {
    let mut out = Transcript::default();
    for line in PREDEFINED_MODES.lines() {
        let Some(args) = line.trim().strip_prefix("/set ") else {
            continue;
        };
        if let Err(e) = Setter::new(store, &mut out, args).run() {
            tracing::error!(line, error = %e, "Predefined feedback command failed");
        }
    }
    store.mark_read_only();
}

/// Which retained preferences changed and must be written back.
#[derive(Debug, Default, Clone, Copy)]
struct Saves {
    modes: bool,
    feedback: bool,
}

struct Setter<'a> {
    store: &'a mut ModeStore,
    out: &'a mut Transcript,
    at: ArgTokenizer,
    saves: Saves,
}

impl<'a> Setter<'a> {
    fn new(store: &'a mut ModeStore, out: &'a mut Transcript, args: &str) -> Self {
        Self {
            store,
            out,
            at: ArgTokenizer::new(args),
            saves: Saves::default(),
        }
    }

    fn run(&mut self) -> Result<(), CommandError> {
        self.at.allowed_options(&["-retain"]);
        let Some(sub) = self.at.next() else {
            if self.at.has_option("-retain") {
                return Err(CommandError::RetainWithoutSetting(self.at.whole().to_string()));
            }
            self.at.check_end()?;
            self.show_feedback_setting();
            self.show_feedback_modes();
            return Ok(());
        };

        match match_name(SUBCOMMANDS, &sub.text) {
            PrefixMatch::Found("format") => self.set_format(),
            PrefixMatch::Found("truncation") => self.set_truncation(),
            PrefixMatch::Found("feedback") => self.set_feedback(),
            PrefixMatch::Found(_) => self.set_mode(),
            PrefixMatch::NotFound => Err(CommandError::UnknownSubcommand {
                command: "/set".to_string(),
                argument: sub.text,
            }),
            PrefixMatch::Ambiguous(candidates) => Err(CommandError::AmbiguousSubcommand {
                command: "/set".to_string(),
                argument: sub.text,
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            }),
        }
    }

    // ============================================================
    // Subcommands
    // ============================================================

    fn set_format(&mut self) -> Result<(), CommandError> {
        self.reject_retain()?;
        let Some(mode) = self.next_mode()? else {
            self.at.check_end()?;
            self.show_formats(None, None);
            return Ok(());
        };
        let Some(field) = self.next_identifier(CommandError::InvalidFieldName)? else {
            self.at.check_end()?;
            self.show_formats(Some(&mode), None);
            return Ok(());
        };
        let Some(format) = self.at.next() else {
            self.at.check_end()?;
            if !self.store.mode(&mode).is_some_and(|m| m.has_field(&field)) {
                return Err(CommandError::InvalidFieldName(field));
            }
            self.show_formats(Some(&mode), Some(&field));
            return Ok(());
        };
        if !format.quoted {
            return Err(CommandError::FormatNotQuoted(format.text));
        }
        self.install(&mode, &field, &format.text)
    }

    fn set_truncation(&mut self) -> Result<(), CommandError> {
        self.reject_retain()?;
        let Some(mode) = self.next_mode()? else {
            self.at.check_end()?;
            self.show_truncations(None);
            return Ok(());
        };
        let Some(length) = self.at.next() else {
            self.at.check_end()?;
            self.show_truncations(Some(&mode));
            return Ok(());
        };
        if length.text.parse::<u32>().is_err() {
            return Err(FeedbackError::InvalidTruncationLength(length.text).into());
        }
        self.install(&mode, TRUNCATION_FIELD, &length.text)
    }

    fn set_mode(&mut self) -> Result<(), CommandError> {
        self.at
            .allowed_options(&["-command", "-quiet", "-delete", "-retain"]);
        let umode = self.next_identifier(CommandError::InvalidModeName)?;
        let omode = self.next_identifier(CommandError::InvalidModeName)?;
        self.at.check_end()?;

        let command = self.at.has_option("-command");
        let quiet = self.at.has_option("-quiet");
        let delete = self.at.has_option("-delete");
        let retain = self.at.has_option("-retain");

        if self.at.option_count() == 0 && omode.is_none() {
            return self.show_mode_settings(umode.as_deref());
        }
        let Some(umode) = umode else {
            return Err(CommandError::MissingMode(self.at.whole().to_string()));
        };

        if delete {
            if command || quiet {
                return Err(CommandError::ConflictingOptions(self.at.whole().to_string()));
            }
            if let Some(extra) = omode {
                return Err(CommandError::UnexpectedAtEnd(extra));
            }
            self.store.delete_mode(&umode, retain)?;
            self.saves.modes = retain;
        } else if retain {
            if command || quiet {
                return Err(CommandError::ConflictingOptions(self.at.whole().to_string()));
            }
            if let Some(extra) = omode {
                return Err(CommandError::UnexpectedAtEnd(extra));
            }
            self.store.retain_mode(&umode)?;
            self.saves.modes = true;
        } else {
            if command && quiet {
                return Err(CommandError::ConflictingOptions(self.at.whole().to_string()));
            }
            if !command && !quiet {
                return Err(CommandError::ModeCreationOption(self.at.whole().to_string()));
            }
            self.store.create_mode(&umode, omode.as_deref(), command)?;
            self.fluff(&format!("Created new feedback mode: {}", umode));
        }
        Ok(())
    }

    fn set_feedback(&mut self) -> Result<(), CommandError> {
        let mode = self.next_mode()?;
        self.at.check_end()?;
        let retain = self.at.has_option("-retain");

        if mode.is_none() && !retain {
            self.show_feedback_setting();
            self.show_feedback_modes();
            return Ok(());
        }

        if retain {
            let target = mode
                .clone()
                .unwrap_or_else(|| self.store.current_name().to_string());
            self.store.retain_current(&target)?;
            self.saves.feedback = true;
        }
        if let Some(mode) = mode {
            let name = self.store.set_current(&mode)?;
            tracing::debug!(mode = %name, "Feedback mode changed");
            self.fluff(&format!("Feedback mode: {}", name));
        }
        Ok(())
    }

    // ============================================================
    // Argument helpers
    // ============================================================

    /// `-retain` is unknown to format and truncation wherever it appears.
    fn reject_retain(&mut self) -> Result<(), CommandError> {
        self.at.allowed_options(&[]);
        if self.at.has_option("-retain") {
            return Err(CommandError::UnknownOption("-retain".to_string()));
        }
        Ok(())
    }

    fn next_identifier(
        &mut self,
        invalid: fn(String) -> CommandError,
    ) -> Result<Option<String>, CommandError> {
        match self.at.next() {
            None => Ok(None),
            Some(token) if !token.quoted && is_identifier(&token.text) => Ok(Some(token.text)),
            Some(token) => Err(invalid(token.text)),
        }
    }

    /// The next argument as a live mode, matched by prefix.
    fn next_mode(&mut self) -> Result<Option<String>, CommandError> {
        match self.next_identifier(CommandError::InvalidModeName)? {
            None => Ok(None),
            Some(name) => Ok(Some(self.store.lookup(&name)?.name().to_string())),
        }
    }

    /// Adds `template` under every remaining selector argument, or under
    /// [`Selector::ALWAYS`] when there are none.
    fn install(&mut self, mode: &str, field: &str, template: &str) -> Result<(), CommandError> {
        let selectors = self
            .at
            .rest()
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        self.at.check_end()?;

        if selectors.is_empty() {
            self.store.set_field(mode, field, template, Selector::ALWAYS)?;
        }
        for selector in selectors {
            self.store.set_field(mode, field, template, selector)?;
        }
        Ok(())
    }

    fn fluff(&mut self, message: &str) {
        let enabled = self.store.current().command_fluff();
        self.out.fluff(enabled, message);
    }

    // ============================================================
    // Show forms
    // ============================================================

    fn show_formats(&mut self, mode: Option<&str>, field: Option<&str>) {
        let modes: Vec<&Mode> = match mode {
            Some(name) => self.store.mode(name).into_iter().collect(),
            None => self.store.modes().collect(),
        };
        for mode in modes {
            show_mode_formats(self.out, mode, field);
        }
    }

    fn show_truncations(&mut self, mode: Option<&str>) {
        let modes: Vec<&Mode> = match mode {
            Some(name) => self.store.mode(name).into_iter().collect(),
            None => self.store.modes().collect(),
        };
        for mode in modes {
            show_mode_truncations(self.out, mode);
        }
    }

    fn show_mode_settings(&mut self, name: Option<&str>) -> Result<(), CommandError> {
        let Some(name) = name else {
            for mode in self.store.modes() {
                show_mode(self.out, mode);
            }
            return Ok(());
        };

        let retained = self.store.retained_mode(name).transpose()?;
        let live = match retained {
            Some(_) => self.store.mode(name),
            None => Some(self.store.lookup(name)?),
        };
        match (retained, live) {
            (Some(retained), live) => {
                show_mode(self.out, &retained);
                self.out
                    .notice(&format!("/set mode -retain {}", retained.name()));
                if let Some(live) = live.filter(|live| **live != retained) {
                    self.out.notice("");
                    show_mode(self.out, live);
                }
            }
            (None, Some(live)) => show_mode(self.out, live),
            (None, None) => {}
        }
        Ok(())
    }

    fn show_feedback_setting(&mut self) {
        let current = self.store.current_name();
        if let Some(retained) = self.store.retained_current() {
            self.out
                .notice(&format!("/set feedback -retain {}", retained));
        }
        if self.store.retained_current() != Some(current) {
            self.out.notice(&format!("/set feedback {}", current));
        }
    }

    fn show_feedback_modes(&mut self) {
        let retained: Vec<&str> = self.store.retained_names().collect();
        if !retained.is_empty() {
            self.out.notice("");
            self.out.notice("Retained feedback modes:");
            for name in retained {
                self.out.notice(&format!("   {}", name));
            }
        }
        self.out.notice("");
        self.out.notice("Available feedback modes:");
        for mode in self.store.modes() {
            self.out.notice(&format!("   {}", mode.name()));
        }
    }
}

fn show_mode(out: &mut Transcript, mode: &Mode) {
    let fluff = if mode.command_fluff() { "-command" } else { "-quiet" };
    out.notice(&format!("/set mode {} {}", mode.name(), fluff));
    show_mode_formats(out, mode, None);
    show_mode_truncations(out, mode);
}

/// One `/set format` line per setting, fields sorted. The truncation field
/// is shown only by `/set truncation`.
fn show_mode_formats(out: &mut Transcript, mode: &Mode, field: Option<&str>) {
    let mut fields: Vec<_> = mode
        .fields()
        .filter(|(name, _)| match field {
            Some(wanted) => name == &wanted,
            None => *name != TRUNCATION_FIELD,
        })
        .collect();
    fields.sort_by_key(|(name, _)| *name);

    for (name, settings) in fields {
        for setting in settings {
            let line = format!(
                "/set format {} {} {} {}",
                mode.name(),
                name,
                to_string_literal(&setting.template),
                setting.selector
            );
            out.notice(line.trim_end());
        }
    }
}

fn show_mode_truncations(out: &mut Transcript, mode: &Mode) {
    for setting in mode.settings(TRUNCATION_FIELD) {
        let line = format!(
            "/set truncation {} {} {}",
            mode.name(),
            setting.template,
            setting.selector
        );
        out.notice(line.trim_end());
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Quotes a template so that it reads back through the tokenizer.
fn to_string_literal(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
