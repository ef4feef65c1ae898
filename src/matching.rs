//! Ambiguous-prefix matching shared by command, subcommand, option and
//! mode name lookup.

/// Outcome of matching a typed token against a set of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixMatch<T> {
    Found(T),
    NotFound,
    Ambiguous(Vec<T>),
}

/// An exact match wins outright; otherwise the items whose key starts with
/// `token` are collected. Ambiguous candidates keep the input order.
pub fn match_prefix<'a, T, I, F>(items: I, token: &str, key: F) -> PrefixMatch<&'a T>
where
    T: ?Sized,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> &str,
{
    let items: Vec<&'a T> = items.into_iter().collect();
    if let Some(exact) = items.iter().find(|item| key(item) == token) {
        return PrefixMatch::Found(*exact);
    }
    let mut candidates: Vec<&'a T> = items
        .into_iter()
        .filter(|item| key(item).starts_with(token))
        .collect();
    match candidates.len() {
        0 => PrefixMatch::NotFound,
        1 => PrefixMatch::Found(candidates.remove(0)),
        _ => PrefixMatch::Ambiguous(candidates),
    }
}

/// Prefix matching over plain names.
pub fn match_name<'a>(names: &[&'a str], token: &str) -> PrefixMatch<&'a str> {
    match match_prefix(names.iter(), token, |name| *name) {
        PrefixMatch::Found(name) => PrefixMatch::Found(*name),
        PrefixMatch::NotFound => PrefixMatch::NotFound,
        PrefixMatch::Ambiguous(all) => PrefixMatch::Ambiguous(all.into_iter().copied().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBCOMMANDS: &[&str] = &["format", "truncation", "feedback", "mode"];

    #[test]
    fn test_unique_prefix() {
        assert_eq!(match_name(SUBCOMMANDS, "tr"), PrefixMatch::Found("truncation"));
    }

    #[test]
    fn test_ambiguous_prefix_lists_all() {
        assert_eq!(
            match_name(SUBCOMMANDS, "f"),
            PrefixMatch::Ambiguous(vec!["format", "feedback"])
        );
    }

    #[test]
    fn test_exact_match_wins() {
        assert_eq!(match_name(&["list", "listall"], "list"), PrefixMatch::Found("list"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_name(SUBCOMMANDS, "x"), PrefixMatch::NotFound);
    }
}
