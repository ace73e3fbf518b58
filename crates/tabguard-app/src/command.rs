use std::str::FromStr;

use serde_json::Value;
use tabguard_core::{TabId, WindowId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Open { target: WindowTarget, pinned: bool },
    Close { tab_id: TabId },
    Focus { window_id: WindowId },
    Badge { enabled: bool },
    Set { key: String, value: Value },
    Show,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTarget {
    Focused,
    New,
    Existing(WindowId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("{command}: unexpected argument {argument:?}")]
    UnexpectedArgument {
        command: &'static str,
        argument: String,
    },
    #[error("not a number: {0:?}")]
    InvalidNumber(String),
}

impl FromStr for ShellCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match name {
            "" => return Err(CommandError::Empty),
            "open" => {
                let mut target = WindowTarget::Focused;
                let mut pinned = false;
                for arg in args.by_ref() {
                    match arg {
                        "pinned" => pinned = true,
                        "new" => target = WindowTarget::New,
                        other => target = WindowTarget::Existing(WindowId(parse_id(other)?)),
                    }
                }
                Self::Open { target, pinned }
            }
            "close" => Self::Close {
                tab_id: TabId(required_id(args.next(), "close", "tab id")?),
            },
            "focus" => Self::Focus {
                window_id: WindowId(required_id(args.next(), "focus", "window id")?),
            },
            "badge" => {
                let enabled = match args.next() {
                    Some("on") => true,
                    Some("off") => false,
                    Some(other) => {
                        return Err(CommandError::UnexpectedArgument {
                            command: "badge",
                            argument: other.to_owned(),
                        })
                    }
                    None => {
                        return Err(CommandError::MissingArgument {
                            command: "badge",
                            argument: "on|off",
                        })
                    }
                };
                Self::Badge { enabled }
            }
            "set" => {
                let (key, raw) = match rest.split_once(char::is_whitespace) {
                    Some((key, raw)) => (key, raw.trim()),
                    None if rest.is_empty() => {
                        return Err(CommandError::MissingArgument {
                            command: "set",
                            argument: "key",
                        })
                    }
                    None => {
                        return Err(CommandError::MissingArgument {
                            command: "set",
                            argument: "value",
                        })
                    }
                };
                // Bare text is taken as a string so templates need no quoting.
                let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
                return Ok(Self::Set {
                    key: key.to_owned(),
                    value,
                });
            }
            "show" => Self::Show,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_owned())),
        };

        if let Some(extra) = args.next() {
            return Err(CommandError::UnexpectedArgument {
                command: command.name(),
                argument: extra.to_owned(),
            });
        }
        Ok(command)
    }
}

impl ShellCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::Focus { .. } => "focus",
            Self::Badge { .. } => "badge",
            Self::Set { .. } => "set",
            Self::Show => "show",
            Self::Quit => "quit",
        }
    }
}

fn required_id(
    arg: Option<&str>,
    command: &'static str,
    argument: &'static str,
) -> Result<u64, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument { command, argument })?;
    parse_id(arg)
}

fn parse_id(arg: &str) -> Result<u64, CommandError> {
    arg.parse()
        .map_err(|_| CommandError::InvalidNumber(arg.to_owned()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(line: &str) -> Result<ShellCommand, CommandError> {
        line.parse()
    }

    #[test]
    fn parses_open_variants() {
        assert_eq!(
            parse("open"),
            Ok(ShellCommand::Open {
                target: WindowTarget::Focused,
                pinned: false
            })
        );
        assert_eq!(
            parse("open 2 pinned"),
            Ok(ShellCommand::Open {
                target: WindowTarget::Existing(WindowId(2)),
                pinned: true
            })
        );
        assert_eq!(
            parse("  open new "),
            Ok(ShellCommand::Open {
                target: WindowTarget::New,
                pinned: false
            })
        );
    }

    #[test]
    fn parses_set_with_json_or_bare_text() {
        assert_eq!(
            parse("set maxTotal 4"),
            Ok(ShellCommand::Set {
                key: "maxTotal".to_owned(),
                value: json!(4)
            })
        );
        assert_eq!(
            parse("set alertMessage Limit: {which}/{maxWhich}"),
            Ok(ShellCommand::Set {
                key: "alertMessage".to_owned(),
                value: json!("Limit: {which}/{maxWhich}")
            })
        );
        assert_eq!(
            parse("set displayAlert false"),
            Ok(ShellCommand::Set {
                key: "displayAlert".to_owned(),
                value: json!(false)
            })
        );
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(
            parse("close 7"),
            Ok(ShellCommand::Close { tab_id: TabId(7) })
        );
        assert_eq!(
            parse("focus 3"),
            Ok(ShellCommand::Focus {
                window_id: WindowId(3)
            })
        );
        assert_eq!(parse("badge off"), Ok(ShellCommand::Badge { enabled: false }));
        assert_eq!(parse("show"), Ok(ShellCommand::Show));
        assert_eq!(parse("exit"), Ok(ShellCommand::Quit));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("reload"), Err(CommandError::Unknown("reload".to_owned())));
        assert_eq!(
            parse("close"),
            Err(CommandError::MissingArgument {
                command: "close",
                argument: "tab id"
            })
        );
        assert_eq!(
            parse("close x"),
            Err(CommandError::InvalidNumber("x".to_owned()))
        );
        assert_eq!(
            parse("show all"),
            Err(CommandError::UnexpectedArgument {
                command: "show",
                argument: "all".to_owned()
            })
        );
        assert_eq!(
            parse("set maxTotal"),
            Err(CommandError::MissingArgument {
                command: "set",
                argument: "value"
            })
        );
    }
}
