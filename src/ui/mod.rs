//! Ratatui renderer
//!
//! Draws a [`TerminalView`] into a frame. Text lines stack upward from the
//! bottom of the screen, with the input line at the baseline. The bezel is a
//! border carrying the countdown in its top-left corner and the terminal id
//! in its bottom-right corner.

use crate::terminal::style::{StyledLine, TEXT_SIZE};
use crate::terminal::view::{Bezel, BezelView, CursorView, TerminalView};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use ratatui::Frame;

const BEZEL_POWERED: Color = Color::Rgb(90, 90, 90);
const BEZEL_OFF: Color = Color::Rgb(40, 40, 40);

const CURSOR_FILLED: &str = "█";
const CURSOR_OUTLINE: &str = "▯";

/// Draw one frame of the game.
pub fn draw(frame: &mut Frame, view: &TerminalView) {
    let area = frame.area();
    let inner = match &view.bezel {
        Some(bezel) => draw_bezel(frame, area, bezel),
        None => area,
    };

    let mut lines: Vec<Line> = view
        .lines
        .iter()
        .take(inner.height as usize)
        .enumerate()
        .map(|(idx, line)| {
            let cursor = if idx == 0 && !view.graphical {
                view.cursor
            } else {
                None
            };
            styled_line(line, cursor)
        })
        .collect();

    // Newest first in the view; oldest at the top on screen
    lines.reverse();
    let padding = (inner.height as usize).saturating_sub(lines.len());
    let text: Vec<Line> = std::iter::repeat(Line::default())
        .take(padding)
        .chain(lines)
        .collect();

    frame.render_widget(Paragraph::new(text), inner);
}

/// Draw the bezel with a centred message, used for the final screens.
pub fn draw_message(frame: &mut Frame, bezel: &BezelView, message: &str) {
    let inner = draw_bezel(frame, frame.area(), bezel);
    let top = inner.y + inner.height / 2;
    let row = Rect::new(inner.x, top, inner.width, inner.height.min(1));
    let text = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default()
            .fg(Color::Rgb(255, 255, 255))
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(text, row);
}

/// Draw the bezel into `area` and return the screen area inside it.
fn draw_bezel(frame: &mut Frame, area: Rect, bezel: &BezelView) -> Rect {
    let border = match bezel.power {
        Bezel::Powered => BEZEL_POWERED,
        Bezel::Off => BEZEL_OFF,
    };

    let countdown = &bezel.countdown;
    let mut countdown_style = Style::default().fg(countdown.colour);
    if countdown.large {
        countdown_style = countdown_style.add_modifier(Modifier::BOLD);
    }
    let countdown_text = if countdown.visible {
        format!(" {} ", countdown.text)
    } else {
        " ".repeat(countdown.text.chars().count() + 2)
    };

    let block = Block::bordered()
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(border))
        .title_top(Line::from(Span::styled(countdown_text, countdown_style)))
        .title_bottom(Line::from(format!(" {} ", bezel.id)).right_aligned());

    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn styled_line(line: &StyledLine, cursor: Option<CursorView>) -> Line<'static> {
    let mut style = Style::default().fg(line.colour);
    if line.size > TEXT_SIZE {
        style = style.add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![Span::styled(line.text.clone(), style)];
    if let Some(cursor) = cursor {
        let glyph = if cursor.filled {
            CURSOR_FILLED
        } else {
            CURSOR_OUTLINE
        };
        spans.push(Span::styled(glyph, Style::default().fg(line.colour)));
    }
    Line::from(spans)
}
