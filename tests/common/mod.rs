//! Fixture engine standing in for a real execution engine.
//!
//! Each code line is one snippet. Understood forms:
//! - `int NAME = VALUE;`
//! - `class NAME {}`
//! - `void NAME() {}` and `void NAME() { OTHER(); }` (unresolved until
//!   `OTHER` is declared)
//! - `import NAME;`
//! - a bare variable name, which reports its value
//!
//! Anything else is rejected with a "cannot find symbol" error.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use snipshell::db::Database;
use snipshell::engine::{Engine, EvalOutcome, EvalStep};
use snipshell::models::{Diagnostic, Entry, EntryKind, EntryStatus, SnippetEvent};
use snipshell::session::SessionRegistry;

#[derive(Debug, Default)]
pub struct FixtureEngine {
    entries: Vec<Entry>,
    values: HashMap<String, String>,
    unresolved: HashMap<String, Vec<String>>,
    next_id: u32,
    next_error: u32,
}

impl FixtureEngine {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_error: 1,
            ..Self::default()
        }
    }

    fn active_named(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.is_active() && e.kind.is_declaration() && e.name == name)
    }

    fn entry(&mut self, kind: EntryKind, name: &str, source: &str) -> Entry {
        let id = self.next_id.to_string();
        self.next_id += 1;
        Entry {
            id,
            name: name.to_string(),
            kind,
            status: EntryStatus::Valid,
            source: source.to_string(),
            type_name: String::new(),
            signature: None,
        }
    }

    fn reject(&mut self, source: &str) -> Vec<SnippetEvent> {
        let id = format!("e{}", self.next_error);
        self.next_error += 1;
        let entry = Entry {
            id,
            name: String::new(),
            kind: EntryKind::Erroneous,
            status: EntryStatus::Rejected,
            source: source.to_string(),
            type_name: String::new(),
            signature: None,
        };
        self.entries.push(entry.clone());
        vec![SnippetEvent {
            diagnostics: vec![Diagnostic::error("cannot find symbol", 0, source.len())],
            ..SnippetEvent::created(entry)
        }]
    }

    /// Adds a declaration, overwriting an active one with the same name.
    fn declare(&mut self, mut entry: Entry, value: Option<String>) -> Vec<SnippetEvent> {
        let mut events = Vec::new();
        let mut previous = EntryStatus::Nonexistent;
        let mut signature_changed = true;

        if let Some(index) = self.active_named(&entry.name) {
            let old = &mut self.entries[index];
            previous = old.status;
            signature_changed = old.type_name != entry.type_name || old.kind != entry.kind;
            old.status = EntryStatus::Overwritten;
            events.push(SnippetEvent {
                previous_status: previous,
                signature_changed: false,
                caused_by: Some(entry.id.clone()),
                ..SnippetEvent::created(old.clone())
            });
        }

        let unresolved = self.unresolved.get(&entry.id).cloned().unwrap_or_default();
        if !unresolved.is_empty() {
            entry.status = EntryStatus::RecoverableDefined;
        }
        if let Some(value) = &value {
            self.values.insert(entry.id.clone(), value.clone());
        }
        self.entries.push(entry.clone());

        let mut primary = SnippetEvent {
            previous_status: previous,
            signature_changed,
            value,
            unresolved,
            ..SnippetEvent::created(entry.clone())
        };
        if previous == EntryStatus::Nonexistent {
            primary.signature_changed = true;
        }
        events.insert(0, primary);
        events.extend(self.resolve_dependents(&entry));
        events
    }

    /// Entries waiting for `declared` become valid.
    fn resolve_dependents(&mut self, declared: &Entry) -> Vec<SnippetEvent> {
        let mut events = Vec::new();
        for index in 0..self.entries.len() {
            let id = self.entries[index].id.clone();
            let Some(names) = self.unresolved.get_mut(&id) else {
                continue;
            };
            if !self.entries[index].is_active() || !names.contains(&declared.name) {
                continue;
            }
            names.retain(|n| n != &declared.name);
            if names.is_empty() {
                let dependent = &mut self.entries[index];
                let previous = dependent.status;
                dependent.status = EntryStatus::Valid;
                events.push(SnippetEvent {
                    previous_status: previous,
                    signature_changed: false,
                    caused_by: Some(declared.id.clone()),
                    ..SnippetEvent::created(dependent.clone())
                });
            }
        }
        events
    }

    fn eval_line(&mut self, line: &str) -> Vec<SnippetEvent> {
        if let Some(rest) = line.strip_prefix("int ") {
            let Some((name, value)) = rest.trim_end_matches(';').split_once('=') else {
                return self.reject(line);
            };
            let mut entry = self.entry(EntryKind::VarWithInitializer, name.trim(), line);
            entry.type_name = "int".to_string();
            return self.declare(entry, Some(value.trim().to_string()));
        }
        if let Some(rest) = line.strip_prefix("class ") {
            let name = rest.trim_end_matches("{}").trim();
            let entry = self.entry(EntryKind::Class, name, line);
            return self.declare(entry, None);
        }
        if let Some(rest) = line.strip_prefix("void ") {
            let Some((name, body)) = rest.split_once("()") else {
                return self.reject(line);
            };
            let mut entry = self.entry(EntryKind::Method, name.trim(), line);
            entry.signature = Some("()void".to_string());
            let calls: Vec<String> = body
                .trim()
                .trim_start_matches('{')
                .trim_end_matches('}')
                .split(';')
                .filter_map(|call| call.trim().strip_suffix("()"))
                .filter(|callee| self.active_named(callee).is_none())
                .map(str::to_string)
                .collect();
            if !calls.is_empty() {
                self.unresolved.insert(entry.id.clone(), calls);
            }
            return self.declare(entry, None);
        }
        if let Some(rest) = line.strip_prefix("import ") {
            let name = rest.trim_end_matches(';').trim();
            let entry = self.entry(EntryKind::SingleTypeImport, name, line);
            self.entries.push(entry.clone());
            return vec![SnippetEvent::created(entry)];
        }
        if let Some(index) = self.active_named(line) {
            let variable = self.entries[index].clone();
            let value = self.values.get(&variable.id).cloned();
            let mut entry = self.entry(EntryKind::VarValue, &variable.name, line);
            entry.type_name = variable.type_name;
            self.entries.push(entry.clone());
            return vec![SnippetEvent {
                value,
                ..SnippetEvent::created(entry)
            }];
        }
        self.reject(line)
    }
}

impl Engine for FixtureEngine {
    fn eval(&mut self, source: &str) -> EvalOutcome {
        let steps = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| EvalStep {
                output: String::new(),
                events: self.eval_line(line),
            })
            .collect();
        EvalOutcome {
            steps,
            incomplete: None,
        }
    }

    fn entries(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    fn drop_entry(&mut self, id: &str) -> Vec<SnippetEvent> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Vec::new();
        };
        let previous = entry.status;
        entry.status = EntryStatus::Dropped;
        vec![SnippetEvent {
            previous_status: previous,
            signature_changed: false,
            ..SnippetEvent::created(entry.clone())
        }]
    }

    fn var_value(&self, id: &str) -> Option<String> {
        self.values.get(id).cloned()
    }

    fn diagnostics(&self, _id: &str) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn unresolved(&self, id: &str) -> Vec<String> {
        self.unresolved.get(id).cloned().unwrap_or_default()
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

pub fn migrated_db() -> Database {
    let db = Database::open_memory().expect("Failed to create in-memory database");
    db.migrate().expect("Failed to run migrations");
    db
}

/// A registry whose sessions run on [`FixtureEngine`] and share `db`.
pub fn registry(db: &Database) -> SessionRegistry {
    let engines = || -> Box<dyn Engine> { Box::new(FixtureEngine::new()) };
    SessionRegistry::new(Arc::new(engines), Arc::new(db.clone()))
}
