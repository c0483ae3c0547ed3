//! Turning a command string into input steps.
//!
//! [`ScriptedPlanner`] understands a small, fixed grammar. `press` and
//! `click` steps may be chained with ` then `. `type` and `paste` take the
//! rest of the line as text, so they end a chain; `write` and `generate`
//! take the whole command after the verb and cannot be chained.
//!
//! | Command              | Plan                                        |
//! |----------------------|---------------------------------------------|
//! | `type <text>`        | type text into the focused element          |
//! | `paste <text>`       | paste text through the clipboard            |
//! | `press <chord>`      | press a key chord, e.g. `cmd+shift+t`       |
//! | `click <x> <y>`      | click at screen coordinates                 |
//! | `write <text>`       | defer: type text where the user next clicks |
//! | `generate <text>`    | same as `write`, for generated content      |
//!
//! `\n` and `\t` in text arguments become newline and tab.

use aura_input::KeyChord;

use crate::error::PlanError;

/// One desktop action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputStep {
    TypeText(String),
    Paste(String),
    KeyPress(KeyChord),
    Click { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPlan {
    /// Run now, under the execution gate.
    Immediate(Vec<InputStep>),
    /// Wait for the user to click a target, then deliver `content` there.
    Deferred { description: String, content: String },
}

/// Decides what a command does.
pub trait CommandPlanner: Send + Sync {
    fn plan(&self, command: &str) -> Result<CommandPlan, PlanError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedPlanner;

impl ScriptedPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandPlanner for ScriptedPlanner {
    fn plan(&self, command: &str) -> Result<CommandPlan, PlanError> {
        let mut remaining = command.trim();
        if remaining.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut steps = Vec::new();
        loop {
            let (verb, rest) = match remaining.split_once(char::is_whitespace) {
                Some((verb, rest)) => (verb, rest.trim_start()),
                None => (remaining, ""),
            };
            let verb = verb.to_lowercase();

            // Text verbs own the rest of the line, ` then ` included.
            match verb.as_str() {
                "write" | "generate" => {
                    if !steps.is_empty() {
                        return Err(invalid(&verb, "a deferred command cannot be chained"));
                    }
                    let content = text_arg(&verb, rest)?;
                    return Ok(CommandPlan::Deferred {
                        description: format!("{} {} chars at the next click", verb, content.chars().count()),
                        content,
                    });
                }
                "type" => {
                    steps.push(InputStep::TypeText(text_arg(&verb, rest)?));
                    break;
                }
                "paste" => {
                    steps.push(InputStep::Paste(text_arg(&verb, rest)?));
                    break;
                }
                _ => {}
            }

            let (arg, next) = match rest.split_once(" then ") {
                Some((arg, next)) => (arg.trim(), Some(next.trim())),
                None => (rest.trim(), None),
            };
            match verb.as_str() {
                "press" | "key" => {
                    let chord = arg.parse::<KeyChord>().map_err(|e| invalid(&verb, e))?;
                    steps.push(InputStep::KeyPress(chord));
                }
                "click" => {
                    let (x, y) = coordinates(&verb, arg)?;
                    steps.push(InputStep::Click { x, y });
                }
                "" => return Err(PlanError::Empty),
                _ => return Err(PlanError::UnknownCommand(verb)),
            }

            match next {
                Some(next) => remaining = next,
                None => break,
            }
        }

        Ok(CommandPlan::Immediate(steps))
    }
}

fn text_arg(verb: &str, rest: &str) -> Result<String, PlanError> {
    if rest.is_empty() {
        return Err(invalid(verb, "missing text"));
    }
    Ok(unescape(rest))
}

fn coordinates(verb: &str, rest: &str) -> Result<(i32, i32), PlanError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let [x, y] = parts.as_slice() else {
        return Err(invalid(verb, "expected <x> <y>"));
    };
    let x = x.parse::<i32>().map_err(|e| invalid(verb, format!("x: {}", e)))?;
    let y = y.parse::<i32>().map_err(|e| invalid(verb, format!("y: {}", e)))?;
    Ok((x, y))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn invalid(verb: &str, message: impl ToString) -> PlanError {
    PlanError::InvalidArgument {
        command: verb.to_string(),
        message: message.to_string(),
    }
}
