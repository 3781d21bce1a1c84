//! Live preview of the manifest rendered from the current selection.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

#[derive(Debug, Default)]
pub struct Preview;

impl Preview {
    pub fn render(&self, xml: &str, target: &str, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!("Preview · {target}"))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line<'_>> = xml.lines().map(styled_line).collect();
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        ratatui::widgets::Widget::render(paragraph, inner, buf);
    }
}

/// Element lines are tinted, `<name>` lines stand out.
fn styled_line(line: &str) -> Line<'_> {
    let trimmed = line.trim_start();
    let style = if trimmed.starts_with("<name>") {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if trimmed.starts_with("<members>") {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    Line::styled(line, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_xml_lines() {
        let area = Rect::new(0, 0, 50, 6);
        let mut buf = Buffer::empty(area);
        Preview.render(
            "<Package>\n    <version>52.0</version>\n</Package>",
            "package.xml",
            area,
            &mut buf,
        );

        let text: String = buf.content.iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Preview · package.xml"));
        assert!(text.contains("<version>52.0</version>"));
    }
}
