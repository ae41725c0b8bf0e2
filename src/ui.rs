use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use workforce_insights::{format_money, InsightReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Managers,
    Departments,
    HiddenGems,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Overview, Page::Managers, Page::Departments, Page::HiddenGems];

    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Managers,
            Page::Managers => Page::Departments,
            Page::Departments => Page::HiddenGems,
            Page::HiddenGems => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::HiddenGems,
            Page::Managers => Page::Overview,
            Page::Departments => Page::Managers,
            Page::HiddenGems => Page::Departments,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Managers => "Managers",
            Page::Departments => "Departments",
            Page::HiddenGems => "Hidden Gems",
        }
    }
}

pub struct App {
    pub report: InsightReport,
    pub current_page: Page,
    pub gems_state: TableState,
}

impl App {
    pub fn new(report: InsightReport) -> Self {
        let mut gems_state = TableState::default();
        if !report.hidden_gems.is_empty() {
            gems_state.select(Some(0));
        }

        Self {
            report,
            current_page: Page::Overview,
            gems_state,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.report.hidden_gems.len();
        if len == 0 {
            return;
        }
        let i = match self.gems_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.gems_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.report.hidden_gems.len();
        if len == 0 {
            return;
        }
        let i = match self.gems_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.gems_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs + headline numbers
            Constraint::Min(0),    // Page content
            Constraint::Length(3), // Key help
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::Managers => render_managers(f, chunks[1], app),
        Page::Departments => render_departments(f, chunks[1], app),
        Page::HiddenGems => render_hidden_gems(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2]);
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|h| Cell::from(*h).style(header_style())))
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let kpis = &app.report.kpis;
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} vs {}", app.report.prior_label, app.report.current_label),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("↓ {} left", kpis.turnover_count),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let report = &app.report;
    let kpis = &report.kpis;
    let risk = &report.risk_mitigation;
    let breakout = &report.stagnation_breakout;

    let label = |text: &str| Span::styled(format!("{:<32}", text), Style::default().fg(Color::Cyan));

    let lines = vec![
        Line::from(vec![
            label(&format!("Total Headcount ({})", report.prior_label)),
            Span::raw(kpis.headcount.to_string()),
        ]),
        Line::from(vec![
            label("Turnover Count"),
            Span::styled(
                format!("{} ({:.1}% rate)", kpis.turnover_count, kpis.turnover_rate * 100.0),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![label("Departure Cost"), Span::raw(format_money(kpis.departure_cost))]),
        Line::from(vec![
            label("Dual Risk Candidates"),
            Span::raw(kpis.dual_risk_candidates.to_string()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Intervention Effectiveness", header_style())),
        Line::from(vec![
            label("  Left Organization"),
            Span::styled(risk.left.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            label("  Still At Risk"),
            Span::styled(risk.still_at_risk.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            label("  Risk Mitigated"),
            Span::styled(risk.mitigated.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("  Failure Rate"),
            Span::raw(format!("{:.1}%", report.risk_failure_rate)),
        ]),
        Line::from(""),
        Line::from(Span::styled("Stagnation Breakout", header_style())),
        Line::from(vec![
            label("  Changed Manager"),
            Span::raw(format!(
                "{} improved / {} stayed",
                breakout.changed_manager_improved, breakout.changed_manager_stayed
            )),
        ]),
        Line::from(vec![
            label("  Same Manager"),
            Span::raw(format!(
                "{} improved / {} stayed",
                breakout.same_manager_improved, breakout.same_manager_stayed
            )),
        ]),
    ];

    let overview = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Overview "),
    );

    f.render_widget(overview, area);
}

fn render_managers(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.report.manager_stagnation.iter().map(|group| {
        Row::new(vec![
            Cell::from(truncate(&group.name, 40)),
            Cell::from(group.count.to_string()).style(Style::default().fg(Color::Red)),
        ])
    });

    let table = Table::new(rows, [Constraint::Length(42), Constraint::Length(16)])
        .header(header_row(&["Manager", "Stagnant Count"]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Stagnant Reports by Manager ({}) ", app.report.current_label)),
        );

    f.render_widget(table, area);
}

fn render_departments(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.report.department_concentration.iter().map(|trend| {
        let color = if trend.current_count > trend.prior_count {
            Color::Red
        } else {
            Color::Green
        };

        Row::new(vec![
            Cell::from(truncate(&trend.department, 40)),
            Cell::from(trend.prior_count.to_string()),
            Cell::from(trend.current_count.to_string()).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(42), Constraint::Length(10), Constraint::Length(10)],
    )
    .header(Row::new(vec![
        Cell::from("Department").style(header_style()),
        Cell::from(app.report.prior_label.clone()).style(header_style()),
        Cell::from(app.report.current_label.clone()).style(header_style()),
    ])
    .style(Style::default().bg(Color::DarkGray)))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Stagnant Headcount by Department "),
    );

    f.render_widget(table, area);
}

fn render_hidden_gems(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.report.hidden_gems.iter().map(|gem| {
        let liability_color = if gem.left { Color::Red } else { Color::Yellow };

        Row::new(vec![
            Cell::from(truncate(&format!("{} {}", gem.first_name, gem.last_name), 24)),
            Cell::from(truncate(&gem.department, 20)),
            Cell::from(truncate(&gem.manager, 20)),
            Cell::from(gem.potential.clone()),
            Cell::from(format_money(gem.replacement_liability))
                .style(Style::default().fg(liability_color)),
            Cell::from(if gem.left { "Left" } else { "Retained" }),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(22),
            Constraint::Length(22),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Name", "Department", "Manager", "Potential", "Liability", "Status"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Dual-Risk Hidden Gems - Total Liability {} ",
                format_money(app.report.hidden_gem_liability)
            )),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.gems_state);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let status_spans = vec![
        Span::styled(" Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
