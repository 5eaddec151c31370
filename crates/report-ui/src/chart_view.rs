//! Horizontal bar charts for the overdue report.
//!
//! Each [`ChartHandle`] is drawn as one line per bar: a fixed-width label,
//! a filled bar scaled to the largest value and the formatted value. The
//! selected bar is highlighted and its tooltip lines are shown in a side
//! panel.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use report_core::formatting::{format_duration, format_number};
use report_runtime::chart_manager::{Bar, ChartHandle, ChartId};

use crate::themes::Theme;

const FILLED: char = '\u{2588}'; // █
const EMPTY: char = '\u{2591}'; // ░
const MAX_LABEL_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 12;
const TOOLTIP_WIDTH: u16 = 34;

/// Fit `label` into exactly `width` columns, cutting with `…` when needed.
pub fn fit_label(label: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let full = UnicodeWidthStr::width(label);
    if full <= width {
        return format!("{}{}", label, " ".repeat(width - full));
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in label.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Value text of a bar for the given chart.
pub fn value_text(chart: ChartId, value: f64) -> String {
    match chart {
        ChartId::Overdue => format!("{}", value.round() as i64),
        ChartId::Duration => format_duration(value),
        ChartId::Variation => format!("{}%", format_number(value, 1)),
    }
}

/// Number of filled cells for `value` on a bar of `width` cells.
pub fn filled_cells(value: f64, max: f64, width: usize) -> usize {
    if width == 0 || max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let cells = ((value / max) * width as f64).round() as usize;
    // a non-zero value always shows at least one cell
    cells.clamp(1, width)
}

/// First bar index to draw so that `selected` is visible in `rows` lines.
pub fn scroll_offset(selected: usize, rows: usize) -> usize {
    if rows == 0 {
        return selected;
    }
    selected.saturating_sub(rows - 1)
}

fn label_width(bars: &[Bar]) -> usize {
    bars.iter()
        .map(|b| UnicodeWidthStr::width(b.label.as_str()))
        .max()
        .unwrap_or(0)
        .min(MAX_LABEL_WIDTH)
}

/// Build the lines of a chart for an inner area `width` columns wide and
/// `rows` lines high.
pub fn chart_lines<'a>(
    handle: &ChartHandle,
    selected: usize,
    width: u16,
    rows: usize,
    theme: &Theme,
) -> Vec<Line<'a>> {
    let bars = &handle.spec.bars;
    if bars.is_empty() {
        return vec![Line::from(Span::styled("Sem dados para exibir", theme.dim))];
    }

    let label_w = label_width(bars);
    let bar_w = (width as usize).saturating_sub(label_w + VALUE_WIDTH + 3);
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    let bar_style = theme.bar_style(handle.id);

    let mut lines = vec![Line::from(Span::styled(
        handle.spec.y_axis_label.clone(),
        theme.dim,
    ))];
    let visible = rows.saturating_sub(1);
    let start = scroll_offset(selected, visible);

    for (i, bar) in bars.iter().enumerate().skip(start).take(visible) {
        let is_selected = i == selected;
        let filled = filled_cells(bar.value, max, bar_w);
        let marker = if is_selected { "▶" } else { " " };
        let label_style = if is_selected {
            theme.bar_selected
        } else {
            theme.label
        };
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), theme.bar_selected),
            Span::styled(fit_label(&bar.label, label_w), label_style),
            Span::raw(" "),
            Span::styled(
                FILLED.to_string().repeat(filled),
                if is_selected { theme.bar_selected } else { bar_style },
            ),
            Span::styled(EMPTY.to_string().repeat(bar_w - filled), theme.dim),
            Span::raw(" "),
            Span::styled(value_text(handle.id, bar.value), theme.value),
        ]));
    }
    lines
}

/// Draw one chart with its tooltip panel.
pub fn render_chart(
    frame: &mut Frame,
    area: Rect,
    handle: Option<&ChartHandle>,
    selected: usize,
    theme: &Theme,
) {
    let Some(handle) = handle else {
        let placeholder = Paragraph::new(Text::from(vec![
            Line::from(""),
            Line::from(Span::styled("Nenhum gráfico gerado", theme.warning)),
            Line::from(Span::styled(
                "Pressione 'r' para processar os arquivos selecionados",
                theme.dim,
            )),
        ]))
        .block(Block::default().borders(Borders::ALL).border_style(theme.border));
        frame.render_widget(placeholder, area);
        return;
    };

    let [chart_area, tooltip_area] =
        Layout::horizontal([Constraint::Min(20), Constraint::Length(TOOLTIP_WIDTH)]).areas(area);

    let inner_width = chart_area.width.saturating_sub(2);
    let inner_rows = chart_area.height.saturating_sub(2) as usize;
    let lines = chart_lines(handle, selected, inner_width, inner_rows, theme);
    let title = format!(
        " {} · {} ",
        handle.spec.title, handle.spec.dataset_label
    );
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(Span::styled(title, theme.header)),
        ),
        chart_area,
    );

    render_tooltip(frame, tooltip_area, handle.spec.bars.get(selected), theme);
}

/// Tooltip panel of the selected bar.
pub fn render_tooltip(frame: &mut Frame, area: Rect, bar: Option<&Bar>, theme: &Theme) {
    let lines: Vec<Line> = match bar {
        Some(bar) => {
            let mut lines = vec![Line::from(Span::styled(bar.label.clone(), theme.value))];
            lines.extend(
                bar.tooltip
                    .iter()
                    .map(|t| Line::from(Span::styled(t.clone(), theme.text))),
            );
            lines
        }
        None => vec![Line::from(Span::styled("-", theme.dim))],
    };
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(" Detalhes "),
        ),
        area,
    );
}

/// One line naming the three charts, the active one highlighted.
pub fn tabs_line<'a>(active: ChartId, titles: impl Fn(ChartId) -> String, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::new();
    for (i, id) in ChartId::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", theme.dim));
        }
        let style = if *id == active {
            theme.tab_active
        } else {
            theme.tab_inactive
        };
        spans.push(Span::styled(titles(*id), style));
    }
    Line::from(spans)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use report_data::aggregator::JobData;
    use report_runtime::chart_manager::{duration_chart, ChartManager};

    fn handle() -> ChartHandle {
        let mut jobs = JobData::new();
        jobs.add_job("A", 70.0, None, None);
        jobs.add_job("A", 30.0, None, None);
        jobs.add_job("BATCH_NIGHTLY_RECONCILIATION_LONG_NAME", 90.0, None, None);
        let mut mgr = ChartManager::new();
        mgr.create(ChartId::Duration, duration_chart(&jobs.duration_stats()))
            .clone()
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_fit_label_pads_and_truncates() {
        assert_eq!(fit_label("abc", 5), "abc  ");
        assert_eq!(fit_label("abcdef", 4), "abc…");
        assert_eq!(UnicodeWidthStr::width(fit_label("Área Afetada", 6).as_str()), 6);
        assert_eq!(fit_label("x", 0), "");
    }

    #[test]
    fn test_value_text_per_chart() {
        assert_eq!(value_text(ChartId::Overdue, 3.0), "3");
        assert_eq!(value_text(ChartId::Duration, 90.0), "1h 30min");
        assert_eq!(value_text(ChartId::Variation, 40.0), "40.0%");
    }

    #[test]
    fn test_filled_cells_scaling() {
        assert_eq!(filled_cells(50.0, 100.0, 20), 10);
        assert_eq!(filled_cells(100.0, 100.0, 20), 20);
        assert_eq!(filled_cells(0.1, 100.0, 20), 1);
        assert_eq!(filled_cells(0.0, 100.0, 20), 0);
        assert_eq!(filled_cells(5.0, 0.0, 20), 0);
    }

    #[test]
    fn test_scroll_offset_keeps_selection_visible() {
        assert_eq!(scroll_offset(0, 5), 0);
        assert_eq!(scroll_offset(4, 5), 0);
        assert_eq!(scroll_offset(7, 5), 3);
    }

    #[test]
    fn test_chart_lines_marks_selected_bar() {
        let theme = Theme::dark();
        let lines = chart_lines(&handle(), 1, 80, 10, &theme);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[0]), "Duração (minutos)");
        assert!(line_text(&lines[1]).starts_with(' '));
        assert!(line_text(&lines[2]).starts_with('▶'));
        assert!(line_text(&lines[2]).ends_with("50min"));
        assert!(line_text(&lines[1]).contains('…'));
    }

    #[test]
    fn test_chart_lines_empty_chart() {
        let theme = Theme::dark();
        let mut h = handle();
        h.spec.bars.clear();
        let lines = chart_lines(&h, 0, 80, 10, &theme);
        assert_eq!(line_text(&lines[0]), "Sem dados para exibir");
    }

    #[test]
    fn test_tabs_line_lists_all_charts() {
        let theme = Theme::dark();
        let line = tabs_line(ChartId::Duration, |id| id.to_string(), &theme);
        let text = line_text(&line);
        assert_eq!(text, "overdueChart │ durationChart │ variationChart");
    }

    #[test]
    fn test_render_chart_shows_tooltip() {
        let backend = TestBackend::new(120, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let h = handle();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_chart(frame, area, Some(&h), 1, &theme);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Detalhes"));
        assert!(content.contains("Execuções: 2"));
    }

    #[test]
    fn test_render_without_chart_does_not_panic() {
        let backend = TestBackend::new(60, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_chart(frame, area, None, 0, &theme);
            })
            .unwrap();
    }
}
