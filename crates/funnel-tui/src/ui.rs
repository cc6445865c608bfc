//! UI rendering for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use funnel_core::model::{Investor, Owner, Stage};

use crate::app::{App, Mode};
use crate::theme;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0]);
    draw_table(frame, app, chunks[1]);
    draw_detail(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    if let Mode::EditNote { buffer, .. } = &app.mode {
        draw_note_popup(frame, buffer);
    }

    // Draw help overlay if active
    if app.show_help {
        draw_help_popup(frame);
    }
}

/// Title plus a one-line summary of the active filters
fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let filters = app.dashboard.filters();
    let stages = if filters.stages.is_empty() {
        "any".to_string()
    } else {
        filters
            .stages
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };

    let search_style = if app.mode == Mode::Search {
        Style::default().fg(theme::FOCUSED)
    } else {
        Style::default().fg(theme::FILTER)
    };
    let cursor = match (app.mode == Mode::Search, app.search_pending()) {
        (true, true) => "_ …",
        (true, false) => "_",
        (false, true) => " …",
        (false, false) => "",
    };

    let line = Line::from(vec![
        Span::styled("search: ", Style::default().fg(theme::DIM)),
        Span::styled(format!("{}{cursor}", app.search_input), search_style),
        Span::styled("  owner: ", Style::default().fg(theme::DIM)),
        Span::styled(filters.owner.to_string(), Style::default().fg(theme::FILTER)),
        Span::styled("  stages: ", Style::default().fg(theme::DIM)),
        Span::styled(stages, Style::default().fg(theme::FILTER)),
        Span::styled("  acting as: ", Style::default().fg(theme::DIM)),
        Span::styled(
            app.focus_owner.to_string(),
            Style::default()
                .fg(theme::FOCUS_OWNER)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let block = Block::default()
        .title(" Investor funnel ")
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_table(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.dashboard.page_view();

    let owner_header = |owner: Owner| {
        let style = if owner == app.focus_owner {
            Style::default()
                .fg(theme::FOCUS_OWNER)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(owner.as_str()).style(style)
    };

    let mut header_cells = vec![
        Cell::from("Name").style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("Company").style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("★").style(Style::default().add_modifier(Modifier::BOLD)),
    ];
    header_cells.extend(Owner::ALL.iter().map(|o| owner_header(*o)));
    header_cells.push(Cell::from("Note").style(Style::default().add_modifier(Modifier::BOLD)));

    let rows: Vec<Row> = view.items.iter().map(|inv| investor_row(inv)).collect();

    let mut widths = vec![
        Constraint::Percentage(30),
        Constraint::Percentage(30),
        Constraint::Length(3),
    ];
    widths.extend(Owner::ALL.iter().map(|_| Constraint::Length(8)));
    widths.push(Constraint::Min(10));

    let block = Block::default()
        .title(format!(" {} of {} investors ", view.filtered, view.total))
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE)
        .border_style(Style::default().fg(theme::FOCUSED));

    let table = Table::new(rows, widths)
        .header(Row::new(header_cells))
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(theme::SELECTED_BG)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if !view.items.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn investor_row(investor: &Investor) -> Row<'static> {
    let mut cells = vec![
        Cell::from(investor.name.clone()),
        Cell::from(investor.company.clone().unwrap_or_default()),
        Cell::from(investor.rating.to_string()),
    ];
    cells.extend(Owner::ALL.iter().map(|owner| stage_cell(investor, *owner)));
    cells.push(Cell::from(first_line(investor.notes.as_deref())).style(Style::default().fg(theme::DIM)));
    Row::new(cells)
}

fn stage_cell(investor: &Investor, owner: Owner) -> Cell<'static> {
    match investor.progress_for(owner) {
        Some(entry) => Cell::from(entry.stage.as_str())
            .style(Style::default().fg(theme::stage_color(entry.stage))),
        None => Cell::from("·").style(Style::default().fg(theme::DIM)),
    }
}

fn first_line(note: Option<&str>) -> String {
    note.and_then(|n| n.lines().next())
        .unwrap_or_default()
        .to_string()
}

/// Full record of the selected investor
fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE);

    let Some(investor) = app.selected_investor() else {
        let empty = Paragraph::new(Span::styled(
            "No investors match the current filters",
            Style::default().fg(theme::DIM),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let field = |label: &'static str, value: Option<&str>| {
        Line::from(vec![
            Span::styled(format!("{label:<10}"), Style::default().fg(theme::DIM)),
            Span::raw(value.unwrap_or("-").to_string()),
        ])
    };

    let mut progress = vec![Span::styled(
        format!("{:<10}", "funnel"),
        Style::default().fg(theme::DIM),
    )];
    for owner in Owner::ALL {
        let text = investor
            .progress_for(owner)
            .map_or_else(|| "-".to_string(), |p| p.stage.title().to_string());
        progress.push(Span::styled(
            format!("{owner}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        progress.push(Span::raw(format!("{text}   ")));
    }

    let lines = vec![
        Line::from(Span::styled(
            investor.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("title", investor.title.as_deref()),
        field("contact", investor.email.as_deref().or(investor.linkedin_url.as_deref())),
        field("location", investor.location.as_deref()),
        Line::from(progress),
        field("note", investor.notes.as_deref()),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.dashboard.page_view();
    let pages = format!(" Page {}/{} ", view.page, view.total_pages.max(1));

    let message = app.status_message.as_deref().unwrap_or("? for help");
    let message_style = if message.contains("failed") {
        Style::default().fg(theme::ERROR)
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled(
            pages,
            Style::default()
                .bg(theme::STATUS_BAR)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(message.to_string(), message_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_note_popup(frame: &mut Frame, buffer: &str) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Note (Enter save, Esc cancel, empty deletes) ")
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE)
        .border_style(Style::default().fg(theme::FOCUSED));

    let paragraph = Paragraph::new(format!("{buffer}_"))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Draw help popup
fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE)
        .border_style(Style::default().fg(theme::FOCUSED));

    let paragraph = Paragraph::new(help_text()).block(block);
    frame.render_widget(paragraph, area);
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn help_text() -> Vec<Line<'static>> {
    let mut lines = vec![
        section("Navigation"),
        Line::from("  j/Down     Move down"),
        Line::from("  k/Up       Move up"),
        Line::from("  n/p        Next/previous page"),
        Line::from(""),
        section("Filters"),
        Line::from("  /          Search name, title, company"),
        Line::from("  o          Cycle owner filter"),
    ];
    lines.extend(Stage::ALL.iter().enumerate().map(|(i, stage)| {
        Line::from(format!("  {}          Toggle {} ({})", i + 1, stage, stage.title()))
    }));
    lines.extend([
        Line::from("  0          Clear stage filter"),
        Line::from(""),
        section("Progress"),
        Line::from("  Tab        Switch acting owner"),
        Line::from("  Space      Toggle owner on investor"),
        Line::from("  l/h        Next/previous stage"),
        Line::from("  e          Edit note"),
        Line::from(""),
        section("General"),
        Line::from("  R          Refresh"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from("  Ctrl+Z     Suspend"),
    ]);
    lines
}

/// Create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
