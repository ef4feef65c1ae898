//! Shell commands: `/list`, `/set`, `/drop` and friends.
//!
//! Commands are looked up by unambiguous prefix. A handler writes to the
//! session transcript and returns a [`CommandError`] on misuse; the
//! dispatcher prints the error and marks the request as failed.

mod set;
mod snippets;
mod tokenizer;

pub use tokenizer::{ArgTokenizer, Token};

pub use set::install_predefined_modes;

use thiserror::Error;

use crate::feedback::FeedbackError;
use crate::matching::{match_prefix, PrefixMatch};
use crate::resolve::ResolveError;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Invalid command: {0}\nType /help for help.")]
    InvalidCommand(String),

    #[error("Command: '{command}' is ambiguous: {}\nType /help for help.", .candidates.join(", "))]
    AmbiguousCommand {
        command: String,
        candidates: Vec<String>,
    },

    #[error("Invalid '{command}' argument: {argument}")]
    UnknownSubcommand { command: String, argument: String },

    #[error("'{command}' argument '{argument}' is ambiguous, use one of: {}", .candidates.join(", "))]
    AmbiguousSubcommand {
        command: String,
        argument: String,
        candidates: Vec<String>,
    },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected arguments at end of command: {0}")]
    UnexpectedAtEnd(String),

    #[error("Conflicting options -- {0}")]
    ConflictingOptions(String),

    #[error("Options and snippets must not both be used: {0}")]
    OptionsWithSnippets(String),

    #[error("In the /drop argument, please specify an import, variable, method, or class to drop.\nSpecify by id or name. Use /list to see ids. Use /reset to reset all state.")]
    MissingDropArgument,

    #[error("Expected a feedback mode name: {0}")]
    MissingMode(String),

    #[error("Expected a feedback mode name, found: {0}")]
    InvalidModeName(String),

    #[error("Expected a field name, found: {0}")]
    InvalidFieldName(String),

    #[error("Expected format enclosed in quotes, found: {0}")]
    FormatNotQuoted(String),

    #[error("Either the -command option or the -quiet option must be set -- {0}")]
    ModeCreationOption(String),

    #[error("No such /help subject: {0}")]
    UnknownHelpSubject(String),

    #[error("A setting to retain must be specified -- {0}")]
    RetainWithoutSetting(String),
}

type Handler = fn(&mut Session, &str) -> Result<(), CommandError>;

/// A registered command.
pub struct Command {
    pub name: &'static str,
    pub args: &'static str,
    pub summary: &'static str,
    handler: Handler,
}

pub static COMMANDS: &[Command] = &[
    Command {
        name: "/list",
        args: "[<name or id>|-all|-start]",
        summary: "list the source you have typed",
        handler: snippets::cmd_list,
    },
    Command {
        name: "/drop",
        args: "<name or id>",
        summary: "delete a source entry",
        handler: snippets::cmd_drop,
    },
    Command {
        name: "/vars",
        args: "[<name or id>|-all|-start]",
        summary: "list the declared variables and their values",
        handler: snippets::cmd_vars,
    },
    Command {
        name: "/methods",
        args: "[<name or id>|-all|-start]",
        summary: "list the declared methods and their signatures",
        handler: snippets::cmd_methods,
    },
    Command {
        name: "/types",
        args: "[<name or id>|-all|-start]",
        summary: "list the type declarations",
        handler: snippets::cmd_types,
    },
    Command {
        name: "/imports",
        args: "",
        summary: "list the imported items",
        handler: snippets::cmd_imports,
    },
    Command {
        name: "/set",
        args: "format|truncation|feedback|mode ...",
        summary: "set feedback configuration",
        handler: set::cmd_set,
    },
    Command {
        name: "/reset",
        args: "",
        summary: "reset the session",
        handler: cmd_reset,
    },
    Command {
        name: "/help",
        args: "[<command>|<subject>]",
        summary: "get information about using the shell",
        handler: cmd_help,
    },
    Command {
        name: "/exit",
        args: "",
        summary: "exit the session",
        handler: cmd_exit,
    },
];

/// Finds a command by exact name or unambiguous prefix.
pub fn find_command(name: &str) -> Result<&'static Command, CommandError> {
    match match_prefix(COMMANDS, name, |c: &Command| c.name) {
        PrefixMatch::Found(command) => Ok(command),
        PrefixMatch::NotFound => Err(CommandError::InvalidCommand(name.to_string())),
        PrefixMatch::Ambiguous(commands) => Err(CommandError::AmbiguousCommand {
            command: name.to_string(),
            candidates: commands.iter().map(|c| c.name.to_string()).collect(),
        }),
    }
}

/// Runs one command line. Returns false when the command failed.
pub(crate) fn dispatch(session: &mut Session, line: &str) -> bool {
    let (name, args) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(name, args)| (name, args.trim()));
    tracing::debug!(session = %session.id(), command = name, "Dispatching command");

    let result = find_command(name).and_then(|command| (command.handler)(session, args));
    match result {
        Ok(()) => true,
        Err(e) => {
            session.out.error(&e.to_string());
            false
        }
    }
}

fn cmd_reset(session: &mut Session, args: &str) -> Result<(), CommandError> {
    ArgTokenizer::new(args).check_end()?;
    session.engine.reset();
    let fluff = session.feedback.current().command_fluff();
    session.out.fluff(fluff, "Resetting state.");
    Ok(())
}

fn cmd_exit(session: &mut Session, args: &str) -> Result<(), CommandError> {
    ArgTokenizer::new(args).check_end()?;
    session.out.notice("Goodbye");
    session.out.notice("Session terminated");
    session.terminate();
    Ok(())
}

const HELP_SUBJECTS: &[(&str, &str)] = &[
    (
        "intro",
        "Type code to evaluate it. Lines starting with / are commands.\nUse /list to see what you have entered and /help <command> for details.",
    ),
    (
        "id",
        "Every snippet gets an id. Start-up snippets are s1, s2, ...\nRejected input is e1, e2, ... Everything else is numbered 1, 2, ...\nCommands accept ids, names and id ranges such as 2-5.",
    ),
];

fn cmd_help(session: &mut Session, args: &str) -> Result<(), CommandError> {
    let mut at = ArgTokenizer::new(args);
    let subject = at.next_text();
    at.check_end()?;

    let Some(subject) = subject else {
        session.out.notice("Type code to evaluate it, or one of these commands:");
        for command in COMMANDS {
            session.out.notice(&format!(
                "{} {}\n\t{}",
                command.name, command.args, command.summary
            ));
        }
        session
            .out
            .notice("For more information type '/help' followed by a command or subject name.");
        return Ok(());
    };

    if let Some((_, text)) = HELP_SUBJECTS.iter().find(|(name, _)| *name == subject) {
        session.out.notice(text);
        return Ok(());
    }

    let name = if subject.starts_with('/') {
        subject.clone()
    } else {
        format!("/{}", subject)
    };
    let matches: Vec<&Command> = COMMANDS.iter().filter(|c| c.name.starts_with(&name)).collect();
    if matches.is_empty() {
        return Err(CommandError::UnknownHelpSubject(subject));
    }
    for command in matches {
        session
            .out
            .notice(&format!("{} {}\n\t{}", command.name, command.args, command.summary));
        if command.name == "/set" {
            for line in set::SET_HELP {
                session.out.notice(line);
            }
        }
    }
    Ok(())
}
