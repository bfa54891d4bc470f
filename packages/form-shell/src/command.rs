use anyhow::{anyhow, bail, Result};
use employee_form::Field;

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Set(Field, String),
    Submit,
    Reset,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  set <field> <value>   edit a field (employeeID, name, email, phoneNumber,
                        department, dateOfJoining, role); omit value to clear
  submit                validate and submit the form
  reset                 clear the form
  show                  print the form
  help                  print this help
  quit                  exit";

/// Parse a line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let (name, value) = match rest.split_once(char::is_whitespace) {
                Some((name, value)) => (name, value.trim()),
                None => (rest, ""),
            };
            if name.is_empty() {
                bail!("usage: set <field> <value>");
            }
            let field: Field = name.parse().map_err(|e| anyhow!("{e}"))?;
            ShellCommand::Set(field, value.to_string())
        }
        "submit" => ShellCommand::Submit,
        "reset" => ShellCommand::Reset,
        "show" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => bail!("unknown command: {other} (try `help`)"),
    };

    Ok(Some(command))
}
