//! Text styles for renderables

use colored::{Color, Colorize};

/// Foreground color plus a handful of attributes.
///
/// Styles are only honored on ANSI surfaces; the plain rendering drops them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub dim: bool,
    pub reverse: bool,
}

impl Style {
    pub const fn plain() -> Self {
        Self {
            fg: None,
            bold: false,
            italic: false,
            dim: false,
            reverse: false,
        }
    }

    pub const fn color(fg: Color) -> Self {
        Self {
            fg: Some(fg),
            ..Self::plain()
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    #[must_use]
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::plain()
    }

    /// Wrap `text` in the ANSI sequences for this style
    pub fn paint(&self, text: &str) -> String {
        if self.is_plain() {
            return text.to_string();
        }

        let mut painted = text.normal();
        if let Some(fg) = self.fg {
            painted = painted.color(fg);
        }
        if self.bold {
            painted = painted.bold();
        }
        if self.italic {
            painted = painted.italic();
        }
        if self.dim {
            painted = painted.dimmed();
        }
        if self.reverse {
            painted = painted.reversed();
        }
        painted.to_string()
    }
}
