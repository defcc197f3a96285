use ansi_term::{Colour, Style};

use crate::store::Status;

/// Styles used by every render function. Built once per command and passed down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub heading: Style,
    pub working: Style,
    pub idle: Style,
    pub muted: Style,
    pub good: Style,
    pub bad: Style,
    pub accent: Style,
}

impl Palette {
    pub fn colored() -> Self {
        Self {
            heading: Style::new().bold(),
            working: Colour::Green.normal(),
            idle: Colour::Fixed(244).normal(),
            muted: Style::new().dimmed(),
            good: Colour::Green.bold(),
            bad: Colour::Red.normal(),
            accent: Colour::Cyan.normal(),
        }
    }

    /// No escape codes at all, for `--no-color` and pipes.
    pub fn plain() -> Self {
        Self {
            heading: Style::new(),
            working: Style::new(),
            idle: Style::new(),
            muted: Style::new(),
            good: Style::new(),
            bad: Style::new(),
            accent: Style::new(),
        }
    }

    pub fn status(&self, status: Status) -> Style {
        match status {
            Status::Working => self.working,
            Status::Idle => self.idle,
        }
    }
}
