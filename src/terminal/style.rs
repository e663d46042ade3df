//! Inline line-styling directives
//!
//! A line of terminal output may begin with any number of bracketed
//! directives that restyle just that line:
//!
//! - `<c g>` switch colour by short code (`g` green, `r` red, `w` white)
//! - `<s 20>` switch font size
//! - `<f name>` switch font family; applied together with the final size
//!
//! Directives are only recognised at the start of the line and are stripped
//! before display. Scanning is a forward-only pass over the prefix.

use ratatui::style::Color;

/// Default terminal text colour
pub const TEXT_COLOUR: Color = Color::Rgb(20, 200, 20);
pub const TEXT_COLOUR_RED: Color = Color::Rgb(200, 20, 20);
pub const TEXT_COLOUR_WHITE: Color = Color::Rgb(255, 255, 255);

/// Default terminal font size
pub const TEXT_SIZE: u16 = 16;

/// Map a colour directive code to a colour.
pub fn colour_for_code(code: &str) -> Option<Color> {
    match code {
        "g" => Some(TEXT_COLOUR),
        "r" => Some(TEXT_COLOUR_RED),
        "w" => Some(TEXT_COLOUR_WHITE),
        _ => None,
    }
}

/// One directive from a line prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Colour(String),
    Size(u16),
    Font(String),
    /// Well-formed but unknown command letter; consumed and ignored
    Unknown(char),
}

/// A display line with its directives resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub text: String,
    pub colour: Color,
    pub size: u16,
    pub font: Option<String>,
}

impl StyledLine {
    /// A line without directives, in the given colour
    pub fn plain(text: impl Into<String>, colour: Color) -> Self {
        Self {
            text: text.into(),
            colour,
            size: TEXT_SIZE,
            font: None,
        }
    }

    /// Resolve the directive prefix of `line`, using `base` as the default colour.
    pub fn parse(line: &str, base: Color) -> Self {
        let mut styled = Self::plain(String::new(), base);
        let mut rest = line;

        while let Some((directive, consumed)) = next_directive(rest) {
            rest = &rest[consumed..];
            match directive {
                Directive::Colour(code) => {
                    styled.colour = colour_for_code(&code).unwrap_or(base);
                }
                Directive::Size(size) => styled.size = size,
                // The font is loaded once the size is known, so just remember it
                Directive::Font(name) => styled.font = Some(name),
                Directive::Unknown(cmd) => {
                    tracing::debug!(%cmd, "ignoring unknown line directive");
                }
            }
        }

        styled.text = rest.to_string();
        styled
    }
}

/// Read one directive from the start of `s`.
///
/// Returns the directive and the number of bytes it occupies, or None if `s`
/// does not start with a well-formed directive.
pub fn next_directive(s: &str) -> Option<(Directive, usize)> {
    let body_start = s.strip_prefix('<')?;
    let close = body_start.find('>')?;
    let body = &body_start[..close];

    let mut chars = body.chars();
    let cmd = chars.next()?;
    if chars.next()? != ' ' {
        return None;
    }
    let arg = chars.as_str();
    if arg.is_empty() || arg.contains(char::is_whitespace) || cmd.is_whitespace() {
        return None;
    }

    let directive = match cmd {
        'c' => Directive::Colour(arg.to_string()),
        's' => Directive::Size(arg.parse().ok()?),
        'f' => Directive::Font(arg.to_string()),
        other => Directive::Unknown(other),
    };

    // '<' + body + '>'
    Some((directive, close + 2))
}
