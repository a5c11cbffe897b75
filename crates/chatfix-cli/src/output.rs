use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Terminal styling that degrades to plain text when stdout is not a
/// terminal.
pub struct Paint {
    enabled: bool,
}

impl Paint {
    pub fn auto() -> Self {
        Self {
            enabled: std::io::stdout().is_terminal(),
        }
    }

    pub fn ok(&self, s: &str) -> String {
        if self.enabled {
            s.green().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn warn(&self, s: &str) -> String {
        if self.enabled {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn err(&self, s: &str) -> String {
        if self.enabled {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn accent(&self, s: &str) -> String {
        if self.enabled {
            s.cyan().to_string()
        } else {
            s.to_string()
        }
    }

    pub fn dim(&self, s: &str) -> String {
        if self.enabled {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }
}
