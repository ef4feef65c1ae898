//! Turns command arguments (names, ids, id ranges) into entries.

use std::cell::OnceCell;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static ID_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[se]?\d+([-\s].*)?$").expect("id pattern is valid"));

const NUMBERED_OFFSET: u32 = 0x2000_0000;
const ERROR_OFFSET: u32 = 0x4000_0000;
const UNPARSED_KEY: u32 = 0x6000_0000;

/// The view of an entry the resolver needs.
pub trait SnippetRef {
    fn id(&self) -> &str;

    /// Name used for name matching; empty when the entry has none.
    fn name(&self) -> &str;

    /// The source text, used in error messages.
    fn source(&self) -> &str {
        ""
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No snippet with id: {0}")]
    UnknownSnippetId(String),

    #[error("No such snippet: {0}")]
    NoMatchingEntries(String),

    #[error("Snippet range endpoint '{endpoint}' does not match a snippet id: {range}")]
    UnknownRangeEndpoint { endpoint: String, range: String },

    #[error("End of snippet range less than start: {start} - {end}")]
    RangeDescending { start: String, end: String },

    #[error("This command does not accept the snippet '{token}' : {snippet}")]
    NotApplicable { token: String, snippet: String },
}

/// Whether a token looks like a snippet id (or an id range).
pub fn looks_like_id(token: &str) -> bool {
    ID_SYNTAX.is_match(token)
}

/// Ordering key for ids: start-up ids (`s<n>`) first, then plain numbers,
/// then error ids (`e<n>`), then anything unparsable.
pub fn order_key(id: &str) -> u32 {
    let numeric = |digits: &str| -> Option<u32> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().filter(|n| *n < NUMBERED_OFFSET)
    };
    if let Some(n) = id.strip_prefix('s').and_then(numeric) {
        n
    } else if let Some(n) = id.strip_prefix('e').and_then(numeric) {
        ERROR_OFFSET + n
    } else if let Some(n) = numeric(id) {
        NUMBERED_OFFSET + n
    } else {
        UNPARSED_KEY
    }
}

/// Resolves argument tokens against a universe of entries.
///
/// The id-ordered view of the universe is built on first use and kept for
/// the life of the resolver.
pub struct Resolver<'a, T, P> {
    universe: &'a [T],
    fallback: Option<&'a [T]>,
    prefer_active: P,
    ordered: OnceCell<Vec<&'a T>>,
}

impl<'a, T, P> Resolver<'a, T, P>
where
    T: SnippetRef,
    P: Fn(&T) -> bool,
{
    pub fn new(universe: &'a [T], prefer_active: P) -> Self {
        Self {
            universe,
            fallback: None,
            prefer_active,
            ordered: OnceCell::new(),
        }
    }

    /// Entries outside the universe consulted only to word the error when a
    /// token misses.
    pub fn with_fallback(mut self, everything: &'a [T]) -> Self {
        self.fallback = Some(everything);
        self
    }

    /// Resolves every token in order and concatenates the results.
    /// Duplicates are kept.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<&'a T>, ResolveError> {
        let mut found = Vec::new();
        for token in tokens {
            found.extend(self.resolve_token(token.as_ref())?);
        }
        Ok(found)
    }

    fn resolve_token(&self, token: &str) -> Result<Vec<&'a T>, ResolveError> {
        if let Some((start, end)) = token.split_once('-') {
            return self.range(token, start, end);
        }
        let matched = self.layered(self.universe, token);
        if matched.is_empty() {
            Err(self.miss(token))
        } else {
            Ok(matched)
        }
    }

    /// Active entries named `token`, else any entry named `token`, else the
    /// entry whose id is `token`.
    fn layered(&self, universe: &'a [T], token: &str) -> Vec<&'a T> {
        let named: Vec<&'a T> = universe.iter().filter(|e| e.name() == token).collect();
        let active: Vec<&'a T> = named
            .iter()
            .copied()
            .filter(|e| (self.prefer_active)(*e))
            .collect();
        if !active.is_empty() {
            return active;
        }
        if !named.is_empty() {
            return named;
        }
        universe.iter().filter(|e| e.id() == token).take(1).collect()
    }

    fn range(&self, token: &str, start: &str, end: &str) -> Result<Vec<&'a T>, ResolveError> {
        let endpoint = |id: &str| {
            self.position(id).ok_or_else(|| {
                let outside = self
                    .fallback
                    .and_then(|everything| everything.iter().find(|e| e.id() == id));
                match outside {
                    Some(entry) => ResolveError::NotApplicable {
                        token: id.to_string(),
                        snippet: entry.source().trim().to_string(),
                    },
                    None => ResolveError::UnknownRangeEndpoint {
                        endpoint: id.to_string(),
                        range: token.to_string(),
                    },
                }
            })
        };
        let first = endpoint(start)?;
        let last = endpoint(end)?;
        if last < first {
            return Err(ResolveError::RangeDescending {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(self.ordered()[first..=last].to_vec())
    }

    fn ordered(&self) -> &[&'a T] {
        self.ordered.get_or_init(|| {
            let mut ordered: Vec<&'a T> = self.universe.iter().collect();
            ordered.sort_by_key(|e| order_key(e.id()));
            ordered
        })
    }

    fn position(&self, id: &str) -> Option<usize> {
        let ordered = self.ordered();
        let key = order_key(id);
        if key == UNPARSED_KEY {
            return None;
        }
        let index = ordered
            .binary_search_by_key(&key, |e| order_key(e.id()))
            .ok()?;
        (ordered[index].id() == id).then_some(index)
    }

    fn miss(&self, token: &str) -> ResolveError {
        if let Some(everything) = self.fallback {
            if let Some(entry) = self.layered(everything, token).first() {
                return ResolveError::NotApplicable {
                    token: token.to_string(),
                    snippet: entry.source().trim().to_string(),
                };
            }
        }
        if looks_like_id(token) {
            ResolveError::UnknownSnippetId(token.to_string())
        } else {
            ResolveError::NoMatchingEntries(token.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        id: &'static str,
        name: &'static str,
        active: bool,
    }

    impl SnippetRef for Item {
        fn id(&self) -> &str {
            self.id
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn item(id: &'static str, name: &'static str, active: bool) -> Item {
        Item { id, name, active }
    }

    fn ids(found: &[&Item]) -> Vec<&'static str> {
        found.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_order_key_classes() {
        assert!(order_key("s9") < order_key("1"));
        assert!(order_key("2") < order_key("10"));
        assert!(order_key("999") < order_key("e1"));
        assert!(order_key("e1") < order_key("bogus"));
    }

    #[test]
    fn test_range_within_numbered_ids() {
        let entries = vec![
            item("e1", "", false),
            item("2", "", true),
            item("s1", "", true),
            item("1", "", true),
        ];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert_eq!(ids(&resolver.resolve(&["1-2"]).unwrap()), vec!["1", "2"]);
    }

    #[test]
    fn test_descending_range() {
        let entries = vec![item("1", "", true), item("2", "", true)];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert_eq!(
            resolver.resolve(&["2-1"]).unwrap_err(),
            ResolveError::RangeDescending {
                start: "2".to_string(),
                end: "1".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_range_endpoint() {
        let entries = vec![item("1", "", true)];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert!(matches!(
            resolver.resolve(&["1-7"]),
            Err(ResolveError::UnknownRangeEndpoint { endpoint, .. }) if endpoint == "7"
        ));
    }

    #[test]
    fn test_active_name_preferred() {
        let entries = vec![item("1", "x", false), item("2", "x", true)];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert_eq!(ids(&resolver.resolve(&["x"]).unwrap()), vec!["2"]);
    }

    #[test]
    fn test_inactive_name_still_matches() {
        let entries = vec![item("1", "x", false)];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert_eq!(ids(&resolver.resolve(&["x"]).unwrap()), vec!["1"]);
    }

    #[test]
    fn test_tokens_concatenate_with_duplicates() {
        let entries = vec![item("1", "x", true), item("2", "y", true)];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert_eq!(
            ids(&resolver.resolve(&["y", "1", "y"]).unwrap()),
            vec!["2", "1", "2"]
        );
    }

    #[test]
    fn test_miss_error_kinds() {
        let entries = vec![item("1", "x", true)];
        let resolver = Resolver::new(&entries, |e: &Item| e.active);
        assert_eq!(
            resolver.resolve(&["7"]).unwrap_err(),
            ResolveError::UnknownSnippetId("7".to_string())
        );
        assert_eq!(
            resolver.resolve(&["nothing"]).unwrap_err(),
            ResolveError::NoMatchingEntries("nothing".to_string())
        );
    }

    #[test]
    fn test_fallback_reports_not_applicable() {
        let everything = vec![item("1", "x", true), item("2", "m", true)];
        let vars = vec![item("1", "x", true)];
        let resolver = Resolver::new(&vars, |e: &Item| e.active).with_fallback(&everything);
        assert!(matches!(
            resolver.resolve(&["m"]),
            Err(ResolveError::NotApplicable { token, .. }) if token == "m"
        ));
    }

    #[test]
    fn test_range_endpoint_outside_universe_is_not_applicable() {
        let everything = vec![
            item("1", "m", true),
            item("2", "x", true),
            item("3", "y", true),
        ];
        let vars = vec![item("2", "x", true), item("3", "y", true)];
        let resolver = Resolver::new(&vars, |e: &Item| e.active).with_fallback(&everything);
        assert!(matches!(
            resolver.resolve(&["1-3"]),
            Err(ResolveError::NotApplicable { token, .. }) if token == "1"
        ));
        assert!(matches!(
            resolver.resolve(&["2-9"]),
            Err(ResolveError::UnknownRangeEndpoint { endpoint, .. }) if endpoint == "9"
        ));
    }
}
