use crate::matching::{match_name, PrefixMatch};

use super::CommandError;

/// One argument of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Whether any part of the token was quoted.
    pub quoted: bool,
}

/// Splits command arguments into tokens and picks out options.
///
/// Tokens are separated by whitespace. Single or double quotes group text
/// and support backslash escapes. An unquoted token starting with `-` is an
/// option; options match the allowed set by unambiguous prefix and may
/// appear anywhere on the line.
#[derive(Debug)]
pub struct ArgTokenizer {
    whole: String,
    tokens: Vec<Token>,
    pos: usize,
    allowed: &'static [&'static str],
    options: Vec<&'static str>,
    bad_options: Vec<String>,
}

impl ArgTokenizer {
    pub fn new(args: &str) -> Self {
        Self {
            whole: args.trim().to_string(),
            tokens: tokenize(args),
            pos: 0,
            allowed: &[],
            options: Vec::new(),
            bad_options: Vec::new(),
        }
    }

    /// Options recognized from here on.
    pub fn allowed_options(&mut self, allowed: &'static [&'static str]) {
        self.allowed = allowed;
    }

    /// The next non-option token. Options passed on the way are recorded.
    pub fn next(&mut self) -> Option<Token> {
        while let Some(token) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;
            if is_option(&token) {
                self.record_option(&token.text);
            } else {
                return Some(token);
            }
        }
        None
    }

    /// The next non-option token's text.
    pub fn next_text(&mut self) -> Option<String> {
        self.next().map(|t| t.text)
    }

    /// Every remaining non-option token.
    pub fn rest(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.next_text()).collect()
    }

    fn record_option(&mut self, text: &str) {
        match match_name(self.allowed, text) {
            PrefixMatch::Found(option) => {
                if !self.options.contains(&option) {
                    self.options.push(option);
                }
            }
            _ => self.bad_options.push(text.to_string()),
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.contains(&option)
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn whole(&self) -> &str {
        &self.whole
    }

    /// Fails on unknown options or leftover arguments.
    pub fn check_end(&mut self) -> Result<(), CommandError> {
        let rest = self.rest();
        if !self.bad_options.is_empty() {
            return Err(CommandError::UnknownOption(self.bad_options.join(" ")));
        }
        if !rest.is_empty() {
            return Err(CommandError::UnexpectedAtEnd(rest.join(" ")));
        }
        Ok(())
    }
}

fn is_option(token: &Token) -> bool {
    !token.quoted && token.text.len() > 1 && token.text.starts_with('-')
}

fn tokenize(args: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = args.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut text = String::new();
        let mut quoted = false;
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '\'' | '"' => {
                    quoted = true;
                    while let Some(q) = chars.next() {
                        match q {
                            _ if q == c => break,
                            '\\' => {
                                if let Some(escaped) = chars.next() {
                                    text.push(unescape(escaped));
                                }
                            }
                            _ => text.push(q),
                        }
                    }
                }
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        text.push(escaped);
                    }
                }
                _ => text.push(c),
            }
        }
        tokens.push(Token { text, quoted });
    }
    tokens
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'b' => '\u{8}',
        'f' => '\u{c}',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_token_keeps_spaces() {
        let mut at = ArgTokenizer::new("verbose display '{pre}x {name}' varinit");
        assert_eq!(at.next_text().as_deref(), Some("verbose"));
        assert_eq!(at.next_text().as_deref(), Some("display"));
        let format = at.next().unwrap();
        assert!(format.quoted);
        assert_eq!(format.text, "{pre}x {name}");
        assert_eq!(at.next_text().as_deref(), Some("varinit"));
        assert!(at.next().is_none());
    }

    #[test]
    fn test_escapes_inside_quotes() {
        let mut at = ArgTokenizer::new(r#""a\"b\nc""#);
        assert_eq!(at.next_text().as_deref(), Some("a\"b\nc"));
    }

    #[test]
    fn test_options_match_by_prefix_anywhere() {
        let mut at = ArgTokenizer::new("mine -q normal");
        at.allowed_options(&["-command", "-quiet", "-delete", "-retain"]);
        assert_eq!(at.rest(), vec!["mine", "normal"]);
        assert!(at.has_option("-quiet"));
        assert_eq!(at.option_count(), 1);
    }

    #[test]
    fn test_unknown_option_reported() {
        let mut at = ArgTokenizer::new("-bogus");
        at.allowed_options(&["-all", "-start"]);
        assert!(matches!(at.check_end(), Err(CommandError::UnknownOption(o)) if o == "-bogus"));
    }

    #[test]
    fn test_leftover_arguments_reported() {
        let mut at = ArgTokenizer::new("a b");
        at.next();
        assert!(matches!(at.check_end(), Err(CommandError::UnexpectedAtEnd(r)) if r == "b"));
    }

    #[test]
    fn test_quoted_dash_is_not_an_option() {
        let mut at = ArgTokenizer::new("'-x'");
        let token = at.next().unwrap();
        assert_eq!(token.text, "-x");
        assert_eq!(at.option_count(), 0);
    }
}
