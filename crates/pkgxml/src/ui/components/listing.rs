//! Quick-panel listing of types and members with their checked markers.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::selection::{
    CHECKED_MARKER, DisplayListing, ListingLine, MEMBER_INDENT, UNCHECKED_MARKER,
};

#[derive(Debug, Default)]
pub struct Listing;

impl Listing {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        listing: &DisplayListing,
        cursor: usize,
        title: &str,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!("Metadata · {title}"));

        if listing.is_empty() {
            let placeholder = Paragraph::new("No metadata types; run `pkgxml reload`")
                .block(block)
                .style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                );
            frame.render_widget(placeholder, area);
            return;
        }

        let items: Vec<ListItem<'_>> = listing.lines().iter().map(line_item).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(32, 52, 70)));
        let mut state = ListState::default().with_selected(Some(cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn line_item(line: &ListingLine) -> ListItem<'_> {
    let (marker, color) = if line.is_checked() {
        (CHECKED_MARKER, Color::Green)
    } else {
        (UNCHECKED_MARKER, Color::DarkGray)
    };

    let mut spans = Vec::with_capacity(3);
    if line.is_member() {
        spans.push(Span::raw(MEMBER_INDENT));
    }
    spans.push(Span::styled(marker, Style::default().fg(color)));
    let name_style = if line.is_member() {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    spans.push(Span::styled(line.name(), name_style));
    ListItem::new(Line::from(spans))
}
