use colored::{ColoredString, Colorize};
use std::io::IsTerminal;

use super::hunk::HunkLineKind;
use crate::config::ColorChoice;

/// Visual roles used by the human-readable report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Strong,
    Open,
    Muted,
    Warning,
    Failure,
    Location,
    Command,
    Added,
    Removed,
    HunkHeader,
}

impl Role {
    pub fn for_hunk(kind: HunkLineKind) -> Option<Role> {
        match kind {
            HunkLineKind::Addition => Some(Role::Added),
            HunkLineKind::Deletion => Some(Role::Removed),
            HunkLineKind::Header => Some(Role::HunkHeader),
            HunkLineKind::Context => None,
        }
    }
}

/// Maps roles to terminal colours, or to nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    color: bool,
}

impl Theme {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn ansi() -> Self {
        Self { color: true }
    }

    /// `Auto` colours only when stdout is a terminal and NO_COLOR is unset.
    /// `Always` also needs colored's global override, which the caller sets.
    pub fn for_choice(choice: ColorChoice) -> Self {
        match choice {
            ColorChoice::Always => Self::ansi(),
            ColorChoice::Never => Self::plain(),
            ColorChoice::Auto => {
                let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
                if std::io::stdout().is_terminal() && !no_color {
                    Self::ansi()
                } else {
                    Self::plain()
                }
            }
        }
    }

    pub fn paint(&self, text: &str, role: Role) -> String {
        if !self.color {
            return text.to_string();
        }
        let styled: ColoredString = match role {
            Role::Strong => text.bold(),
            Role::Open | Role::Added => text.green(),
            Role::Muted => text.bright_black(),
            Role::Warning => text.yellow(),
            Role::Failure | Role::Removed => text.red(),
            Role::Location => text.blue(),
            Role::Command | Role::HunkHeader => text.cyan(),
        };
        styled.to_string()
    }
}
