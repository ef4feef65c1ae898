//! Commands that list or drop entries: `/list`, `/vars`, `/methods`,
//! `/types`, `/imports`, `/drop`.

use crate::models::{Entry, EntryKind, EntryStatus};
use crate::resolve::Resolver;
use crate::session::Session;

use super::{ArgTokenizer, CommandError};

/// Indentation of continuation lines in `/list`, matching `"   1 : "`.
const LIST_CONTINUATION: &str = "\n       ";

/// Picks the entries a listing command acts on.
///
/// No arguments means the active entries of `universe`; `-all` means all
/// of them; `-start` the start-up entries. Otherwise each argument is
/// resolved by name, id or range, with misses checked against every entry
/// so the error can say the command does not apply.
fn select_entries(
    args: &str,
    universe: Vec<Entry>,
    everything: &[Entry],
) -> Result<Vec<Entry>, CommandError> {
    let mut at = ArgTokenizer::new(args);
    at.allowed_options(&["-all", "-start"]);
    let tokens = at.rest();
    at.check_end()?;

    if at.option_count() > 0 && !tokens.is_empty() {
        return Err(CommandError::OptionsWithSnippets(at.whole().to_string()));
    }
    if at.option_count() > 1 {
        return Err(CommandError::ConflictingOptions(at.whole().to_string()));
    }
    if at.has_option("-all") {
        return Ok(universe);
    }
    if at.has_option("-start") {
        return Ok(universe
            .into_iter()
            .filter(|e| e.id.starts_with('s'))
            .collect());
    }
    if tokens.is_empty() {
        return Ok(universe.into_iter().filter(Entry::is_active).collect());
    }

    let resolver = Resolver::new(&universe, Entry::is_active).with_fallback(everything);
    let selected = resolver.resolve(&tokens)?;
    Ok(selected.into_iter().cloned().collect())
}

fn entries_of_kind(
    session: &Session,
    args: &str,
    keep: fn(&Entry) -> bool,
) -> Result<Vec<Entry>, CommandError> {
    let everything = session.engine.entries();
    let universe: Vec<Entry> = everything.iter().filter(|e| keep(e)).cloned().collect();
    select_entries(args, universe, &everything)
}

pub(crate) fn cmd_list(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let entries = entries_of_kind(session, args, |_| true)?;
    session.out.line("");
    for entry in entries {
        let source = entry.source.trim_end().replace('\n', LIST_CONTINUATION);
        session.out.line(&format!("{:>4} : {}", entry.id, source));
    }
    Ok(())
}

pub(crate) fn cmd_vars(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let entries = entries_of_kind(session, args, |e| e.kind.is_variable())?;
    for entry in entries {
        let value = if entry.status == EntryStatus::Valid {
            let raw = session.engine.var_value(&entry.id).unwrap_or_default();
            session.feedback.current().truncate_var_value(&raw)?
        } else {
            "(not-active)".to_string()
        };
        let name = if entry.name.is_empty() { "_" } else { entry.name.as_str() };
        session
            .out
            .notice(&format!("  {} {} = {}", entry.type_name, name, value));
    }
    Ok(())
}

pub(crate) fn cmd_methods(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let entries = entries_of_kind(session, args, |e| e.kind == EntryKind::Method)?;
    for entry in entries {
        let signature = entry.signature.as_deref().unwrap_or_default();
        let line = match signature.rfind(')') {
            Some(i) => format!(
                "  {} {}{}{}",
                &signature[i + 1..],
                entry.name,
                &signature[..=i],
                inactive_note(&entry)
            ),
            None => format!("  {}{}", entry.name, inactive_note(&entry)),
        };
        session.out.notice(&line);
        session.report_status(&entry);
    }
    Ok(())
}

pub(crate) fn cmd_types(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let entries = entries_of_kind(session, args, |e| e.kind.is_type())?;
    for entry in entries {
        let keyword = entry.kind.type_keyword().unwrap_or_default();
        session.out.notice(&format!(
            "  {} {}{}",
            keyword,
            entry.name,
            inactive_note(&entry)
        ));
        session.report_status(&entry);
    }
    Ok(())
}

pub(crate) fn cmd_imports(session: &mut Session, args: &str) -> Result<(), CommandError> {
    ArgTokenizer::new(args).check_end()?;
    let imports: Vec<Entry> = session
        .engine
        .entries()
        .into_iter()
        .filter(|e| e.kind.is_import() && e.is_active())
        .collect();
    for entry in imports {
        let source = entry.source.trim().trim_end_matches(';');
        session.out.notice(&format!("    {}", source));
    }
    Ok(())
}

pub(crate) fn cmd_drop(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let mut at = ArgTokenizer::new(args);
    let tokens = at.rest();
    at.check_end()?;
    if tokens.is_empty() {
        return Err(CommandError::MissingDropArgument);
    }

    let everything = session.engine.entries();
    let active: Vec<Entry> = everything.iter().filter(|e| e.is_active()).cloned().collect();
    let resolver = Resolver::new(&active, Entry::is_active).with_fallback(&everything);
    let targets: Vec<Entry> = resolver.resolve(&tokens)?.into_iter().cloned().collect();

    for target in targets {
        tracing::debug!(id = %target.id, "Dropping entry");
        for event in session.engine.drop_entry(&target.id) {
            session.report_event(&event);
        }
    }
    Ok(())
}

fn inactive_note(entry: &Entry) -> &'static str {
    if entry.is_active() {
        ""
    } else {
        " (not-active)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, status: EntryStatus) -> Entry {
        Entry {
            id: id.to_string(),
            name: name.to_string(),
            kind: EntryKind::VarWithInitializer,
            status,
            source: format!("int {} = 0;", name),
            type_name: "int".to_string(),
            signature: None,
        }
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("s1", "boot", EntryStatus::Valid),
            entry("1", "a", EntryStatus::Valid),
            entry("2", "b", EntryStatus::Dropped),
        ]
    }

    #[test]
    fn test_no_arguments_selects_active() {
        let all = sample();
        let selected = select_entries("", all.clone(), &all).unwrap();
        assert_eq!(ids(&selected), vec!["s1", "1"]);
    }

    #[test]
    fn test_all_and_start_options() {
        let all = sample();
        assert_eq!(ids(&select_entries("-all", all.clone(), &all).unwrap()), vec!["s1", "1", "2"]);
        assert_eq!(ids(&select_entries("-st", all.clone(), &all).unwrap()), vec!["s1"]);
    }

    #[test]
    fn test_options_and_arguments_conflict() {
        let all = sample();
        assert!(matches!(
            select_entries("-all a", all.clone(), &all),
            Err(CommandError::OptionsWithSnippets(_))
        ));
        assert!(matches!(
            select_entries("-all -start", all.clone(), &all),
            Err(CommandError::ConflictingOptions(_))
        ));
    }

    #[test]
    fn test_arguments_resolve_names_and_ranges() {
        let all = sample();
        let selected = select_entries("b s1-1", all.clone(), &all).unwrap();
        assert_eq!(ids(&selected), vec!["2", "s1", "1"]);
    }
}
