//! Command scripts for the `toastq` driver
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! notify title="Saved" description="Profile updated"
//! update 1 title=Done variant=destructive
//! dismiss 1
//! close 1
//! clear
//! wait 500
//! ```

use std::time::Duration;

use crate::error::ToastError;
use crate::toast::{NotificationId, ToastAction, ToastPatch, ToastPayload, Toaster, Variant};

/// A parsed script command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Notify(ToastPayload),
    Update(NotificationId, ToastPatch),
    Dismiss(Option<NotificationId>),
    Close(NotificationId),
    Clear,
    Wait(Duration),
}

/// Parse a whole script, reporting the first bad line
pub fn parse_script(input: &str) -> Result<Vec<Command>, ToastError> {
    let mut commands = Vec::new();
    for (index, line) in input.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(command)) => commands.push(command),
            Ok(None) => {}
            Err(message) => {
                return Err(ToastError::Script {
                    line: index + 1,
                    message,
                });
            }
        }
    }
    Ok(commands)
}

/// Parse one line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens = tokenize(trimmed)?;
    let Some((name, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match name.as_str() {
        "notify" => Command::Notify(parse_payload(args)?),
        "update" => {
            let (id, rest) = split_id(args, "update")?;
            Command::Update(id, parse_patch(rest)?)
        }
        "dismiss" => match args {
            [] => Command::Dismiss(None),
            [id] => Command::Dismiss(Some(parse_id(id)?)),
            _ => return Err("dismiss takes at most one id".to_string()),
        },
        "close" => match args {
            [id] => Command::Close(parse_id(id)?),
            _ => return Err("close takes exactly one id".to_string()),
        },
        "clear" => {
            expect_no_args(args, "clear")?;
            Command::Clear
        }
        "wait" => match args {
            [ms] => Command::Wait(Duration::from_millis(
                ms.parse()
                    .map_err(|_| format!("invalid wait duration '{}'", ms))?,
            )),
            _ => return Err("wait takes a duration in milliseconds".to_string()),
        },
        other => return Err(format!("unknown command '{}'", other)),
    };

    Ok(Some(command))
}

/// Run parsed commands against `toaster`, sleeping on `wait`
pub async fn run_script(toaster: &Toaster, commands: &[Command]) {
    for command in commands {
        match command {
            Command::Notify(payload) => {
                let handle = toaster.notify(payload.clone());
                log::debug!("notify -> toast {}", handle.id());
            }
            Command::Update(id, patch) => toaster.update(*id, patch.clone()),
            Command::Dismiss(id) => toaster.dismiss(*id),
            Command::Close(id) => toaster.on_external_close(*id),
            Command::Clear => toaster.clear(),
            Command::Wait(duration) => tokio::time::sleep(*duration).await,
        }
    }
}

// Whitespace-separated tokens; double quotes group, backslash escapes inside quotes
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err("dangling escape at end of line".to_string()),
            },
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_id(raw: &str) -> Result<NotificationId, String> {
    raw.parse::<u64>()
        .map(NotificationId::from)
        .map_err(|_| format!("invalid toast id '{}'", raw))
}

fn split_id<'a>(args: &'a [String], command: &str) -> Result<(NotificationId, &'a [String]), String> {
    match args.split_first() {
        Some((id, rest)) => Ok((parse_id(id)?, rest)),
        None => Err(format!("{} needs a toast id", command)),
    }
}

fn expect_no_args(args: &[String], command: &str) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("{} takes no arguments", command))
    }
}

fn parse_variant(raw: &str) -> Result<Variant, String> {
    match raw {
        "default" => Ok(Variant::Default),
        "destructive" => Ok(Variant::Destructive),
        other => Err(format!("unknown variant '{}'", other)),
    }
}

fn key_values(args: &[String]) -> Result<Vec<(&str, &str)>, String> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .ok_or_else(|| format!("expected key=value, got '{}'", arg))
        })
        .collect()
}

fn parse_payload(args: &[String]) -> Result<ToastPayload, String> {
    let patch = parse_patch(args)?;
    Ok(ToastPayload {
        title: patch.title,
        description: patch.description,
        action: patch.action,
        variant: patch.variant.unwrap_or_default(),
    })
}

fn parse_patch(args: &[String]) -> Result<ToastPatch, String> {
    let mut patch = ToastPatch::new();
    for (key, value) in key_values(args)? {
        patch = match key {
            "title" => patch.title(value),
            "description" => patch.description(value),
            "action" => patch.action(ToastAction::new(value)),
            "variant" => patch.variant(parse_variant(value)?),
            other => return Err(format!("unknown field '{}'", other)),
        };
    }
    Ok(patch)
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod script_tests;
