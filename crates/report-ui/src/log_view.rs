//! Debug and error log panels.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use report_runtime::activity_log::ActivityLog;

use crate::themes::Theme;

/// The newest `rows` items of `items`, oldest first.
pub fn tail<T>(items: Vec<T>, rows: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(rows);
    items.into_iter().skip(skip).collect()
}

/// Draw the debug log (left) and the error log (right) side by side.
pub fn render_logs(frame: &mut Frame, area: Rect, log: &ActivityLog, theme: &Theme) {
    let [debug_area, error_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
    let rows = area.height.saturating_sub(2) as usize;

    let debug: Vec<Line> = tail(log.debug_lines().collect(), rows)
        .into_iter()
        .map(|l| {
            Line::from(vec![
                Span::styled(format!("[{}] ", l.time), theme.dim),
                Span::styled(l.message.clone(), theme.text),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Text::from(debug)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(" Log ", theme.info)),
        ),
        debug_area,
    );

    let errors: Vec<Line> = tail(log.error_lines().collect(), rows)
        .into_iter()
        .map(|e| Line::from(Span::styled(e.to_string(), theme.error)))
        .collect();
    let title = format!(" Erros ({}) ", log.error_count());
    let title_style = if log.error_count() > 0 {
        theme.error
    } else {
        theme.dim
    };
    frame.render_widget(
        Paragraph::new(Text::from(errors)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(title, title_style)),
        ),
        error_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use report_core::time_utils::TimezoneHandler;

    #[test]
    fn test_tail_keeps_newest() {
        assert_eq!(tail(vec![1, 2, 3, 4], 2), vec![3, 4]);
        assert_eq!(tail(vec![1], 5), vec![1]);
        assert!(tail(vec![1, 2], 0).is_empty());
    }

    #[test]
    fn test_render_logs_shows_both_panels() {
        let mut log = ActivityLog::new(TimezoneHandler::new("UTC"));
        log.info("2 arquivos carregados");
        log.error("Erro ao processar x.xlsx");

        let backend = TestBackend::new(100, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_logs(frame, area, &log, &theme);
            })
            .unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("2 arquivos carregados"));
        assert!(content.contains("Erros (1)"));
    }
}
