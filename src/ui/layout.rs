use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Narrow terminals drop the key help line from the footer.
const KEY_HELP_MIN_WIDTH: u16 = 60;

pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub footer: Rect,
    pub show_key_help: bool,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let show_key_help = area.width >= KEY_HELP_MIN_WIDTH;
        let footer_height = if show_key_help { 2 } else { 1 };

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(footer_height),
            ])
            .split(area);

        Self {
            header: vertical[0],
            main: centered_column(vertical[1], 100),
            footer: vertical[2],
            show_key_help,
        }
    }
}

/// Horizontally centre a column at most `max_width` wide.
pub fn centered_column(area: Rect, max_width: u16) -> Rect {
    let width = area.width.min(max_width);
    let left = area.x.saturating_add((area.width - width) / 2);
    Rect::new(left, area.y, width, area.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_splits_full_height() {
        let layout = AppLayout::new(Rect::new(0, 0, 120, 30));
        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.footer.height, 2);
        assert_eq!(layout.main.height, 27);
        assert_eq!(layout.main.width, 100);
        assert_eq!(layout.main.x, 10);
        assert!(layout.show_key_help);
    }

    #[test]
    fn test_narrow_layout_hides_key_help() {
        let layout = AppLayout::new(Rect::new(0, 0, 40, 20));
        assert!(!layout.show_key_help);
        assert_eq!(layout.footer.height, 1);
        assert_eq!(layout.main.width, 40);
    }
}
