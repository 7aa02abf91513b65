//! Tab bar and the three view renderers.

use super::fragments::{cursor_style, value_spans, LinkCursor};
use super::theme::parse_hex;
use super::{fit, ThemeColors};
use crate::app::{App, Focus, InputMode};
use crate::session::ViewContent;
use crate::views::{ChartView, ItemState, TableView, TreeBrowser};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

pub(super) fn draw_tabs(f: &mut Frame<'_>, app: &App, area: Rect, colors: &ThemeColors) {
    let manifest = app.session.manifest();
    let active = app.session.view().key();
    let titles: Vec<Line<'_>> = manifest
        .tab_views()
        .enumerate()
        .map(|(i, view)| Line::from(format!("{} {}", i + 1, view.title)))
        .collect();
    let selected = manifest.tab_views().position(|v| Some(v.key.as_str()) == active);

    let title = match app.session.package() {
        Some(package) => format!(" {} ", package.label()),
        None => " Strata ".to_string(),
    };
    let tabs = Tabs::new(titles)
        .select(selected.unwrap_or(0))
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border))
                .style(Style::default().bg(colors.bg)),
        )
        .style(Style::default().fg(colors.text))
        .highlight_style(
            Style::default()
                .fg(colors.heading)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    f.render_widget(tabs, area);
}

pub(super) fn draw_view(f: &mut Frame<'_>, app: &mut App, area: Rect, colors: &ThemeColors) {
    let focus = app.focus;
    let filtering = matches!(app.input, InputMode::Filter);
    match app.session.view_mut().content_mut() {
        Some(ViewContent::Tree(tree)) => draw_tree_view(f, tree, focus, area, colors),
        Some(ViewContent::Table(table)) => draw_table(f, table, filtering, area, colors),
        Some(ViewContent::Chart(chart)) => draw_chart(f, chart, area, colors),
        Some(ViewContent::Error(message)) => draw_message(f, message, colors.error, area, colors),
        None => draw_message(f, "No view selected", colors.text, area, colors),
    }
}

fn panel<'a>(title: String, colors: &ThemeColors) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .style(Style::default().bg(colors.bg))
}

fn draw_message(f: &mut Frame<'_>, message: &str, fg: Color, area: Rect, colors: &ThemeColors) {
    let paragraph = Paragraph::new(message.to_string())
        .block(panel(String::new(), colors))
        .style(Style::default().fg(fg))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_tree_view(
    f: &mut Frame<'_>,
    tree: &mut TreeBrowser,
    focus: Focus,
    area: Rect,
    colors: &ThemeColors,
) {
    let area = if tree.item_list().is_some() {
        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);
        draw_items(f, tree, focus == Focus::Items, content[1], colors);
        content[0]
    } else {
        area
    };
    draw_tree(f, tree, focus == Focus::Main, area, colors);
}

fn draw_tree(f: &mut Frame<'_>, tree: &mut TreeBrowser, focused: bool, area: Rect, colors: &ThemeColors) {
    let height = area.height.saturating_sub(2) as usize;
    tree.adjust_scroll(height);
    let cursor = tree.cursor();
    let offset = tree.scroll_offset();

    let items: Vec<ListItem<'_>> = tree
        .visible_items()
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .filter_map(|(idx, item)| {
            let node = tree.node(&item.path)?;
            let indent = "  ".repeat(item.level);
            let icon = match (item.has_children, item.expanded) {
                (true, true) => "▼ ",
                (true, false) => "▶ ",
                _ => "  ",
            };
            let label_style = if idx == cursor && focused {
                cursor_style(colors)
            } else if tree.is_selected(&item.path) {
                Style::default().fg(colors.heading).add_modifier(Modifier::BOLD)
            } else if tree.is_leaf(node) {
                Style::default().fg(colors.value)
            } else {
                Style::default().fg(colors.text)
            };
            let mut spans = vec![
                Span::raw(format!("{indent}{icon}")),
                Span::styled(tree.node_label(node), label_style),
            ];
            let rank = tree.node_rank(node);
            if !rank.is_empty() {
                spans.push(Span::styled(format!("  {rank}"), Style::default().fg(colors.muted)));
            }
            Some(ListItem::new(Line::from(spans)))
        })
        .collect();

    let list = List::new(items).block(panel(" Tree ".to_string(), colors));
    f.render_widget(list, area);
}

fn draw_items(f: &mut Frame<'_>, tree: &TreeBrowser, focused: bool, area: Rect, colors: &ThemeColors) {
    let Some(list) = tree.item_list() else {
        return;
    };
    let block = panel(format!(" {} ", list.leaf.name), colors);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let (header, color) = match &list.state {
        ItemState::Loading => ("Loading...".to_string(), colors.muted),
        ItemState::Failed(message) => (message.clone(), colors.error),
        ItemState::Loaded(_) if tree.has_valid_filter() => {
            let mark = if tree.valid_only() { "[x]" } else { "[ ]" };
            (
                format!("{}  {} {} (v)", tree.item_stats(), mark, tree.valid_filter_label()),
                colors.label,
            )
        },
        ItemState::Loaded(_) => (tree.item_stats(), colors.label),
    };
    f.render_widget(Paragraph::new(header).style(Style::default().fg(color)), chunks[0]);

    let columns = tree.item_columns();
    let rows: Vec<Row<'_>> = tree
        .shown_items()
        .into_iter()
        .map(|row| {
            let base = if tree.is_valid_item(row) {
                Style::default().fg(colors.text)
            } else {
                Style::default().fg(colors.muted)
            };
            let cells = tree.item_cells(row).into_iter().map(|value| {
                let spans = value_spans(&value, base, colors, &mut LinkCursor::default());
                Cell::from(Line::from(spans))
            });
            Row::new(cells)
        })
        .collect();
    let widths = vec![Constraint::Fill(1); columns.len().max(1)];
    let header = Row::new(columns.iter().map(|c| c.header().to_string()))
        .style(Style::default().fg(colors.heading).add_modifier(Modifier::BOLD));
    let mut table = Table::new(rows, widths).header(header);
    if focused {
        table = table.row_highlight_style(cursor_style(colors));
    }
    let mut state = TableState::default().with_selected(Some(tree.item_cursor()));
    f.render_stateful_widget(table, chunks[1], &mut state);
}

fn draw_table(f: &mut Frame<'_>, table: &TableView, filtering: bool, area: Rect, colors: &ThemeColors) {
    let block = panel(format!(" {} ", table.stats()), colors);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    if table.is_searchable() {
        let style = if filtering {
            Style::default().fg(colors.heading)
        } else {
            Style::default().fg(colors.muted)
        };
        let cursor = if filtering { "_" } else { "" };
        f.render_widget(
            Paragraph::new(format!("Filter: {}{}", table.filter(), cursor)).style(style),
            chunks[0],
        );
    }

    if table.is_empty() {
        f.render_widget(
            Paragraph::new(table.empty_message()).style(Style::default().fg(colors.muted)),
            chunks[1],
        );
        return;
    }

    let header = Row::new(table.columns().iter().enumerate().map(|(i, c)| {
        let style = Style::default().fg(colors.heading).add_modifier(Modifier::BOLD);
        let style = if i == table.sort_column() && c.sortable {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        };
        Cell::from(table.header(c)).style(style)
    }));
    let rows: Vec<Row<'_>> = table
        .visible_rows()
        .map(|row| {
            Row::new(table.cells(row).into_iter().map(|value| {
                let base = Style::default().fg(colors.text);
                Cell::from(Line::from(value_spans(&value, base, colors, &mut LinkCursor::default())))
            }))
        })
        .collect();
    let widths = vec![Constraint::Fill(1); table.columns().len().max(1)];
    let widget = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(cursor_style(colors));
    let mut state = TableState::default().with_selected(Some(table.cursor()));
    f.render_stateful_widget(widget, chunks[1], &mut state);
}

const VALUE_WIDTH: usize = 10;

fn draw_chart(f: &mut Frame<'_>, chart: &ChartView, area: Rect, colors: &ThemeColors) {
    let block = panel(" Chart ".to_string(), colors);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if chart.is_empty() {
        f.render_widget(
            Paragraph::new("No data").style(Style::default().fg(colors.muted)),
            inner,
        );
        return;
    }

    let width = chart.width();
    let col_width = (inner.width as usize)
        .saturating_sub(VALUE_WIDTH)
        .checked_div(width)
        .unwrap_or(0)
        .max(4);
    let height = inner.height.saturating_sub(1) as usize;
    let (cursor_row, _) = chart.cursor();
    let offset = (cursor_row + 1).saturating_sub(height);
    let current = chart.current_cell();

    let heading = Style::default().fg(colors.heading).add_modifier(Modifier::BOLD);
    let mut header: Vec<Span<'_>> = chart
        .headers()
        .iter()
        .take(width)
        .map(|h| Span::styled(fit(h, col_width), heading))
        .collect();
    if let Some(value) = chart.headers().last() {
        header.push(Span::styled(fit(value, VALUE_WIDTH), heading));
    }
    let mut lines = vec![Line::from(header)];

    for r in offset..(offset + height).min(chart.len()) {
        let mut spans = Vec::new();
        let mut c = 0;
        while c < width {
            let Some(cell) = chart.cell_at(r, c) else {
                spans.push(Span::raw(" ".repeat(col_width)));
                c += 1;
                continue;
            };
            let span_cols = (cell.col + cell.colspan).min(width).saturating_sub(c).max(1);
            let starts_here = chart.rows()[r].iter().any(|own| std::ptr::eq(own, cell));
            let text = if starts_here && c == cell.col { cell.label.as_str() } else { "" };
            let style = if current.is_some_and(|cur| std::ptr::eq(cur, cell)) {
                cursor_style(colors)
            } else {
                let fg = if cell.light { Color::Rgb(40, 40, 40) } else { Color::Rgb(251, 241, 199) };
                let bg = cell.color.as_deref().and_then(parse_hex).unwrap_or(colors.bg);
                Style::default().fg(fg).bg(bg)
            };
            spans.push(Span::styled(fit(text, col_width * span_cols), style));
            c += span_cols;
        }
        spans.push(Span::styled(
            fit(chart.value(r), VALUE_WIDTH),
            Style::default().fg(colors.value),
        ));
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines), inner);
}
