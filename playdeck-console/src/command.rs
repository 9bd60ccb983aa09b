//! Line-oriented commands that stand in for chat interactions.

use playdeck_core::ControlId;
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  open <surface>              post a player reply as <surface>
  press <control> [surface]   press a button (playButton, stopButton, ...)
  pick <control> <value>      choose a select menu value
  add <query>                 submit the add-track form
  join <channel> | leave      move the acting user in or out of voice
  scope <id>                  act in another community
  delete <surface>            make a surface refuse further edits
  finish                      end the current track
  help | quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("'{command}' needs {what}")]
    MissingArgument { command: &'static str, what: &'static str },

    #[error("unknown control '{0}'")]
    UnknownControl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open { surface: String },
    Press { control: ControlId, surface: Option<String> },
    Pick { control: ControlId, value: String },
    Add { query: String },
    Join { channel: String },
    Leave,
    Scope { id: String },
    Delete { surface: String },
    Finish,
    Help,
    Quit,
}

fn control(word: Option<&str>, command: &'static str) -> Result<ControlId, CommandError> {
    let word = word.ok_or(CommandError::MissingArgument {
        command,
        what: "a control id",
    })?;
    ControlId::from_str(word).map_err(|_| CommandError::UnknownControl(word.to_string()))
}

fn required(
    word: Option<&str>,
    command: &'static str,
    what: &'static str,
) -> Result<String, CommandError> {
    word.map(str::to_string)
        .ok_or(CommandError::MissingArgument { command, what })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut words = rest.split_whitespace();

        match verb {
            "open" => Ok(Self::Open {
                surface: required(words.next(), "open", "a surface id")?,
            }),
            "press" => Ok(Self::Press {
                control: control(words.next(), "press")?,
                surface: words.next().map(str::to_string),
            }),
            "pick" => Ok(Self::Pick {
                control: control(words.next(), "pick")?,
                value: required(words.next(), "pick", "a value")?,
            }),
            "add" if rest.is_empty() => Err(CommandError::MissingArgument {
                command: "add",
                what: "a query",
            }),
            "add" => Ok(Self::Add {
                query: rest.to_string(),
            }),
            "join" => Ok(Self::Join {
                channel: required(words.next(), "join", "a channel id")?,
            }),
            "leave" => Ok(Self::Leave),
            "scope" => Ok(Self::Scope {
                id: required(words.next(), "scope", "a scope id")?,
            }),
            "delete" => Ok(Self::Delete {
                surface: required(words.next(), "delete", "a surface id")?,
            }),
            "finish" => Ok(Self::Finish),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
