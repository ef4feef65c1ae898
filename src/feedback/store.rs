use std::collections::BTreeMap;

use crate::matching::{match_prefix, PrefixMatch};

use super::{FeedbackError, Mode, Selector};

/// All feedback modes of one session.
///
/// Holds the live modes, the encoded retained modes waiting to be
/// persisted, which mode is current and which one is restored on the next
/// start-up.
#[derive(Debug)]
pub struct ModeStore {
    modes: BTreeMap<String, Mode>,
    retained: BTreeMap<String, String>,
    current: Option<String>,
    retained_current: Option<String>,
    blank: Mode,
}

impl Default for ModeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStore {
    pub fn new() -> Self {
        Self {
            modes: BTreeMap::new(),
            retained: BTreeMap::new(),
            current: None,
            retained_current: None,
            blank: Mode::new("", false),
        }
    }

    /// The current mode, or a blank mode before one has been chosen.
    pub fn current(&self) -> &Mode {
        self.current
            .as_ref()
            .and_then(|name| self.modes.get(name))
            .unwrap_or(&self.blank)
    }

    pub fn current_name(&self) -> &str {
        self.current().name()
    }

    pub fn retained_current(&self) -> Option<&str> {
        self.retained_current.as_deref()
    }

    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes.get(name)
    }

    /// Live modes sorted by name.
    pub fn modes(&self) -> impl Iterator<Item = &Mode> {
        self.modes.values()
    }

    /// Names of retained modes, sorted.
    pub fn retained_names(&self) -> impl Iterator<Item = &str> {
        self.retained.keys().map(String::as_str)
    }

    /// Decodes the retained copy of one mode.
    pub fn retained_mode(&self, name: &str) -> Option<Result<Mode, FeedbackError>> {
        self.retained.get(name).map(|encoded| {
            Mode::decode_all(encoded).and_then(|modes| {
                modes.into_iter().next().ok_or_else(|| {
                    FeedbackError::ModeDecodeCorruption(format!("empty record for '{}'", name))
                })
            })
        })
    }

    /// Finds a live mode by exact name or unambiguous prefix.
    pub fn lookup(&self, name: &str) -> Result<&Mode, FeedbackError> {
        match match_prefix(self.modes.values(), name, Mode::name) {
            PrefixMatch::Found(mode) => Ok(mode),
            PrefixMatch::NotFound => Err(FeedbackError::UnknownMode(name.to_string())),
            PrefixMatch::Ambiguous(modes) => Err(FeedbackError::AmbiguousMode {
                name: name.to_string(),
                candidates: modes.iter().map(|m| m.name().to_string()).collect(),
            }),
        }
    }

    /// Creates a mode, optionally copying every setting of `copy_from`
    /// (matched by prefix).
    pub fn create_mode(
        &mut self,
        name: &str,
        copy_from: Option<&str>,
        command_fluff: bool,
    ) -> Result<&Mode, FeedbackError> {
        if self.modes.contains_key(name) {
            return Err(FeedbackError::ModeAlreadyExists(name.to_string()));
        }
        let mode = match copy_from {
            Some(source) => Mode::copy_of(name, self.lookup(source)?, command_fluff),
            None => Mode::new(name, command_fluff),
        };
        tracing::debug!(mode = name, copy_from, "Created feedback mode");
        Ok(self.modes.entry(name.to_string()).or_insert(mode))
    }

    /// Adds a setting to a live mode, named exactly.
    pub fn set_field(
        &mut self,
        mode: &str,
        field: &str,
        template: &str,
        selector: Selector,
    ) -> Result<(), FeedbackError> {
        let target = self
            .modes
            .get_mut(mode)
            .ok_or_else(|| FeedbackError::UnknownMode(mode.to_string()))?;
        if target.is_read_only() {
            return Err(FeedbackError::ReadOnlyMode(mode.to_string()));
        }
        target.set(field, template, selector);
        Ok(())
    }

    /// Deletes a mode by exact name. With `include_retained` the retained
    /// copy goes too and the mode need only exist in one of the two maps.
    pub fn delete_mode(&mut self, name: &str, include_retained: bool) -> Result<(), FeedbackError> {
        let live = self.modes.get(name);
        let known = live.is_some() || (include_retained && self.retained.contains_key(name));
        if !known {
            return Err(FeedbackError::UnknownMode(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            return Err(FeedbackError::CurrentModeUndeletable(name.to_string()));
        }
        if include_retained && self.retained_current.as_deref() == Some(name) {
            return Err(FeedbackError::RetainedModeUndeletable(name.to_string()));
        }
        if live.is_some_and(Mode::is_read_only) {
            return Err(FeedbackError::ReadOnlyMode(name.to_string()));
        }

        self.modes.remove(name);
        if include_retained {
            self.retained.remove(name);
        }
        tracing::debug!(mode = name, include_retained, "Deleted feedback mode");
        Ok(())
    }

    /// Makes a mode (matched by prefix) current and returns its full name.
    pub fn set_current(&mut self, name: &str) -> Result<String, FeedbackError> {
        let full = self.lookup(name)?.name().to_string();
        self.current = Some(full.clone());
        Ok(full)
    }

    /// Marks a mode (matched by prefix) as the one restored on start-up.
    /// It must be retained or predefined.
    pub fn retain_current(&mut self, name: &str) -> Result<String, FeedbackError> {
        let mode = self.lookup(name)?;
        let full = mode.name().to_string();
        if !mode.is_read_only() && !self.retained.contains_key(&full) {
            return Err(FeedbackError::ModeNotRetained(full));
        }
        self.retained_current = Some(full.clone());
        Ok(full)
    }

    /// Snapshots a live mode, named exactly, into the retained map.
    pub fn retain_mode(&mut self, name: &str) -> Result<(), FeedbackError> {
        let mode = self
            .modes
            .get(name)
            .ok_or_else(|| FeedbackError::UnknownMode(name.to_string()))?;
        if mode.is_read_only() {
            return Err(FeedbackError::ReadOnlyMode(name.to_string()));
        }
        self.retained.insert(name.to_string(), mode.encode());
        Ok(())
    }

    /// All retained modes as one blob.
    pub fn encoded_retained(&self) -> String {
        self.retained.values().map(String::as_str).collect()
    }

    /// Restores retained modes from a persisted blob.
    ///
    /// Either every mode is restored or none is. On corruption the retained
    /// map is cleared and the error returned so the caller can drop the
    /// persisted copy.
    pub fn restore_encoded(&mut self, encoded: &str) -> Result<usize, FeedbackError> {
        let modes = match Mode::decode_all(encoded) {
            Ok(modes) => modes,
            Err(e) => {
                self.retained.clear();
                return Err(e);
            }
        };
        let count = modes.len();
        for mode in modes {
            let name = mode.name().to_string();
            self.retained.insert(name.clone(), mode.encode());
            self.modes.insert(name, mode);
        }
        Ok(count)
    }

    /// Marks every live mode read-only. Run once after the predefined
    /// modes are installed.
    pub fn mark_read_only(&mut self) {
        for mode in self.modes.values_mut() {
            mode.mark_read_only();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> ModeStore {
        let mut store = ModeStore::new();
        for name in names {
            store.create_mode(name, None, true).unwrap();
        }
        store
    }

    #[test]
    fn test_blank_current_before_selection() {
        let store = ModeStore::new();
        assert_eq!(store.current_name(), "");
    }

    #[test]
    fn test_create_duplicate_fails() {
        let mut store = store_with(&["mine"]);
        assert_eq!(
            store.create_mode("mine", None, true).unwrap_err(),
            FeedbackError::ModeAlreadyExists("mine".to_string())
        );
    }

    #[test]
    fn test_lookup_by_prefix() {
        let store = store_with(&["normal", "verbose", "vivid"]);
        assert_eq!(store.lookup("n").unwrap().name(), "normal");
        assert!(matches!(
            store.lookup("v"),
            Err(FeedbackError::AmbiguousMode { candidates, .. }) if candidates == vec!["verbose", "vivid"]
        ));
        assert!(matches!(store.lookup("q"), Err(FeedbackError::UnknownMode(_))));
    }

    #[test]
    fn test_lookup_exact_beats_prefix() {
        let store = store_with(&["test", "tester"]);
        assert_eq!(store.lookup("test").unwrap().name(), "test");
    }

    #[test]
    fn test_read_only_mode_rejects_edits() {
        let mut store = store_with(&["fixed"]);
        store.mark_read_only();
        assert_eq!(
            store.set_field("fixed", "display", "x", Selector::ALWAYS),
            Err(FeedbackError::ReadOnlyMode("fixed".to_string()))
        );
        assert_eq!(
            store.delete_mode("fixed", false),
            Err(FeedbackError::ReadOnlyMode("fixed".to_string()))
        );
    }

    #[test]
    fn test_current_mode_undeletable() {
        let mut store = store_with(&["mine"]);
        store.set_current("mine").unwrap();
        assert_eq!(
            store.delete_mode("mine", false),
            Err(FeedbackError::CurrentModeUndeletable("mine".to_string()))
        );
    }

    #[test]
    fn test_retain_current_requires_retained_mode() {
        let mut store = store_with(&["mine"]);
        assert_eq!(
            store.retain_current("mine"),
            Err(FeedbackError::ModeNotRetained("mine".to_string()))
        );
        store.retain_mode("mine").unwrap();
        assert_eq!(store.retain_current("mi").unwrap(), "mine");
        assert_eq!(store.retained_current(), Some("mine"));
    }

    #[test]
    fn test_restore_corrupt_blob_discards_all() {
        let mut store = store_with(&["mine"]);
        store.retain_mode("mine").unwrap();
        let blob = format!("{}broken", store.encoded_retained());

        let mut fresh = ModeStore::new();
        assert!(fresh.restore_encoded(&blob).is_err());
        assert_eq!(fresh.retained_names().count(), 0);
        assert!(fresh.mode("mine").is_none());
    }
}
