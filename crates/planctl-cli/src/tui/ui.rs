//! Dashboard rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};

use planctl_client::models::{Plan, PlanStatus};
use planctl_core::guard::ConfirmationKind;

use super::app::{App, PendingAction};

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status tabs
            Constraint::Min(3),    // plan table
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);
    render_table(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if let Some(pending) = &app.pending {
        render_prompt(f, pending);
    }
    if app.show_help {
        render_help(f);
    }
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = PlanStatus::ALL
        .iter()
        .map(|&status| Line::from(format!("{status} ({})", app.state.count(status))))
        .collect();
    let selected = PlanStatus::ALL
        .iter()
        .position(|&status| status == app.state.filter)
        .unwrap_or(0);

    let api_name = app
        .state
        .api
        .as_ref()
        .map_or("...", |api| api.name.as_str());

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Plans: {api_name} ")),
        );
    f.render_widget(tabs, area);
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let header_cells = ["Name", "Security", "Status", "Order"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1);

    let rows = app.state.plans.iter().enumerate().map(|(i, plan)| {
        let style = if i == app.selected {
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(plan.name.clone()),
            Cell::from(security_label(plan)),
            Cell::from(status_colored(plan.status)),
            Cell::from(plan.order.to_string()),
        ])
        .style(style)
    });

    let title = if app.state.loading {
        " Plans (loading) "
    } else {
        " Plans "
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if app.state.plans.is_empty() && !app.state.loading {
        let empty = Paragraph::new("There is no plan (yet).")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(block);

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.state.filter),
        Style::default().bg(Color::Blue).fg(Color::White),
    )];

    if let Some(error) = &app.state.error {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(error.clone(), Style::default().fg(Color::Red)));
    } else if let Some(notification) = &app.notification {
        let color = if notification.is_error() {
            Color::Red
        } else {
            Color::Green
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            notification.text().to_owned(),
            Style::default().fg(color),
        ));
    }

    spans.push(Span::raw(
        "  q:quit  Tab:status  p:publish  d:deprecate  c:close  r:refresh  ?:help",
    ));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_prompt(f: &mut Frame, pending: &PendingAction) {
    let area = centered_rect(60, 9, f.area());
    f.render_widget(Clear, area);

    let answer = match &pending.prompt.kind {
        ConfirmationKind::Confirm => Line::from(vec![
            Span::styled("[Enter] ", Style::default().fg(Color::Green)),
            Span::raw(pending.prompt.confirm_label.clone()),
            Span::styled("   [Esc] ", Style::default().fg(Color::Red)),
            Span::raw("Cancel"),
        ]),
        ConfirmationKind::TypeToConfirm { expected } => Line::from(vec![
            Span::raw(format!("Type \"{expected}\": ")),
            Span::styled(
                pending.input.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled("_", Style::default().fg(Color::DarkGray)),
        ]),
    };

    let mut lines = vec![
        Line::from(pending.prompt.message.clone()),
        Line::from(""),
        answer,
    ];
    if let ConfirmationKind::TypeToConfirm { .. } = pending.prompt.kind {
        lines.push(Line::from(Span::styled(
            format!("[Enter] {}   [Esc] Cancel", pending.prompt.confirm_label),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let dialog = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", pending.prompt.title)),
    );
    f.render_widget(dialog, area);
}

fn render_help(f: &mut Frame) {
    let area = centered_rect(50, 15, f.area());
    f.render_widget(Clear, area);

    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("  Navigation", heading)),
        Line::from("    j/Down    Move down"),
        Line::from("    k/Up      Move up"),
        Line::from("    Tab       Next status tab"),
        Line::from("    r         Refresh now"),
        Line::from(""),
        Line::from(Span::styled("  Actions", heading)),
        Line::from("    p         Publish the selected plan"),
        Line::from("    d         Deprecate the selected plan"),
        Line::from("    c         Close the selected plan"),
        Line::from(""),
        Line::from("    Esc/q     Close / Quit"),
    ];

    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(help, area);
}

// -- Helpers --

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(r);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn security_label(plan: &Plan) -> String {
    match plan.security_type() {
        Some(security) => security.to_string(),
        None => plan.mode.to_string(),
    }
}

fn status_colored(status: PlanStatus) -> Span<'static> {
    let color = match status {
        PlanStatus::Staging => Color::Cyan,
        PlanStatus::Published => Color::Green,
        PlanStatus::Deprecated => Color::Yellow,
        PlanStatus::Closed => Color::Red,
    };
    Span::styled(status.to_string(), Style::default().fg(color))
}
