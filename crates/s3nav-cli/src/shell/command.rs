//! Command line parsing.

use std::str::FromStr;

use s3nav_core::Intent;

/// Help text printed by `help`.
pub const HELP: &str = "\
Commands:
  ls                   show the current list
  open <bucket>        open a bucket
  cd <label>           enter a folder, go up with `..`, or preview an object
  rm <key>             delete an object
  mv <key> <new-key>   rename an object; quote keys with spaces (\"a b\" or 'a b')
  mb <name>            create a bucket
  / <query>            fuzzy-filter the current list
  pick <label>         select a label from the filtered list
  clear                end the search
  root                 back to the bucket list
  refresh              re-read the current list
  whoami               show the active identity
  help                 show this help
  quit                 exit";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Open(String),
    Cd(String),
    Remove(String),
    Move { from: String, to: String },
    MakeBucket(String),
    Search(String),
    Pick(String),
    Clear,
    Root,
    Refresh,
    Whoami,
    Help,
    Quit,
}

/// Errors produced while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line was blank.
    #[error("empty command")]
    Empty,

    /// The command name is not known.
    #[error("unknown command '{0}', type `help` for a list")]
    Unknown(String),

    /// A required argument is missing or malformed.
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        // `/query` and `/ query` are both accepted.
        if let Some(query) = line.strip_prefix('/') {
            return Ok(Self::Search(query.trim().to_string()));
        }

        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((line, ""));

        let required = |usage: &'static str| {
            if rest.is_empty() {
                Err(ParseError::Usage(usage))
            } else {
                Ok(rest.to_string())
            }
        };
        let bare = |command: Self, usage: &'static str| {
            if rest.is_empty() {
                Ok(command)
            } else {
                Err(ParseError::Usage(usage))
            }
        };

        match name {
            "ls" => bare(Self::List, "ls"),
            "open" => required("open <bucket>").map(Self::Open),
            "cd" => required("cd <label>").map(Self::Cd),
            "rm" => required("rm <key>").map(Self::Remove),
            "mv" => {
                let usage = ParseError::Usage("mv <key> <new-key>");
                let mut parts = split_words(rest).ok_or_else(|| usage.clone())?.into_iter();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(from), Some(to), None) => Ok(Self::Move { from, to }),
                    _ => Err(usage),
                }
            }
            "mb" => required("mb <name>").map(Self::MakeBucket),
            "pick" => required("pick <label>").map(Self::Pick),
            "clear" => bare(Self::Clear, "clear"),
            "root" => bare(Self::Root, "root"),
            "refresh" => bare(Self::Refresh, "refresh"),
            "whoami" => bare(Self::Whoami, "whoami"),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Splits `input` on whitespace, keeping quoted runs together.
///
/// Single or double quotes group a word and are removed. Returns `None` when
/// a quote is left open.
fn split_words(input: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}

impl Command {
    /// Returns the navigator intent behind this command, if any.
    pub fn into_intent(self) -> Option<Intent> {
        let intent = match self {
            Self::Open(bucket) => Intent::SelectBucket(bucket),
            Self::Cd(label) => Intent::Select(label),
            Self::Remove(key) => Intent::Delete(key),
            Self::Move { from, to } => Intent::Rename { from, to },
            Self::MakeBucket(name) => Intent::CreateBucket(name),
            Self::Search(query) => Intent::Search(query),
            Self::Pick(label) => Intent::Pick(label),
            Self::Clear => Intent::ClearSearch,
            Self::Root => Intent::GoBucketRoot,
            Self::Refresh => Intent::Refresh,
            Self::List | Self::Whoami | Self::Help | Self::Quit => return None,
        };
        Some(intent)
    }
}
