//! Command parsing and senders

use ahash::AHashSet;

use crate::notify::COMMAND_PERMISSION;

/// Whoever typed the command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSender {
    pub name: String,
    permissions: AHashSet<String>,
    all_permissions: bool,
}

impl CommandSender {
    pub fn new<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
            all_permissions: false,
        }
    }

    /// The server console holds every permission
    pub fn console() -> Self {
        Self {
            name: "CONSOLE".to_string(),
            permissions: AHashSet::new(),
            all_permissions: true,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.all_permissions || self.permissions.contains(permission)
    }
}

/// A recognised `clearlag` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearlagCommand {
    /// Reduce now
    Cleanup,
    Reload,
    Status,
    /// Anything else after `clearlag`
    Usage,
}

impl ClearlagCommand {
    pub fn permission(&self) -> &'static str {
        COMMAND_PERMISSION
    }
}

/// Parse a console line. Returns None if it is not a clearlag command.
///
/// A leading `/` is accepted, and the command name is case-insensitive.
pub fn parse_command(line: &str) -> Option<ClearlagCommand> {
    let mut words = line.trim().trim_start_matches('/').split_whitespace();
    let name = words.next()?;
    if !name.eq_ignore_ascii_case("clearlag") {
        return None;
    }
    let args: Vec<&str> = words.collect();
    let command = match args.as_slice() {
        [] => ClearlagCommand::Cleanup,
        [arg] if arg.eq_ignore_ascii_case("reload") => ClearlagCommand::Reload,
        [arg] if arg.eq_ignore_ascii_case("status") => ClearlagCommand::Status,
        _ => ClearlagCommand::Usage,
    };
    Some(command)
}
