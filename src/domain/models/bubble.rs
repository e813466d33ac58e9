#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use super::Author;
use super::Message;
use super::MessageType;

// Columns left free on the right for the scrollbar.
const SCROLLBAR_GUTTER: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

pub struct Bubble<'a> {
    message: &'a Message,
    alignment: BubbleAlignment,
    window_max_width: u16,
}

impl<'a> Bubble<'a> {
    pub fn new(
        message: &'a Message,
        alignment: BubbleAlignment,
        window_max_width: u16,
    ) -> Bubble<'a> {
        return Bubble {
            message,
            alignment,
            window_max_width,
        };
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let window_max_width = self.window_max_width as usize;

        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length = ((window_max_width as f32 * 0.04).ceil()) as usize;

        // left border + left padding + (text, not counted) + right padding + right
        // border + scrollbar. And then minimum bubble padding.
        let line_border_width = 4 + SCROLLBAR_GUTTER + min_bubble_padding_length;

        let message_lines = self
            .message
            .as_string_lines(window_max_width.saturating_sub(line_border_width).max(1));

        let username = self.message.author.to_string();
        let username_length = username.chars().count();
        let max_line_length = message_lines
            .iter()
            .map(|line| {
                return line.chars().count();
            })
            .chain([username_length])
            .max()
            .unwrap_or(username_length);

        let bubble_padding = " ".repeat(
            window_max_width.saturating_sub(max_line_length + 4 + SCROLLBAR_GUTTER),
        );

        let mut rows = vec![format!(
            "╭{username}{}╮",
            "─".repeat(max_line_length + 2 - username_length)
        )];
        for line in message_lines {
            let fill = " ".repeat(max_line_length - line.chars().count());
            rows.push(format!("│ {line}{fill} │"));
        }
        rows.push(format!("╰{}╯", "─".repeat(max_line_length + 2)));

        return rows
            .into_iter()
            .map(|row| {
                let padding = Span::from(bubble_padding.to_string());
                if self.alignment == BubbleAlignment::Left {
                    return Line::from(vec![self.highlight_span(row), padding]);
                }
                return Line::from(vec![padding, self.highlight_span(row)]);
            })
            .collect();
    }

    fn highlight_span(&self, text: String) -> Span<'static> {
        if self.message.message_type() == MessageType::Error {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Red),
                    ..Style::default()
                },
            );
        } else if self.message.author == Author::Muesli {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Rgb(138, 85, 63)), // Brown
                    ..Style::default()
                },
            );
        }

        return Span::from(text);
    }
}
