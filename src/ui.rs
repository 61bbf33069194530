use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lcr_simulator::{
    impact_table, Category, Direction, LcrMetrics, Phase, ProductType, SimulationEngine,
    TransactionRequest,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::io;
use std::str::FromStr;

/// Upper end of the gauge scale, in percent
const GAUGE_MAX: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    SimulationLogic,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::SimulationLogic,
            Page::SimulationLogic => Page::Dashboard,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::SimulationLogic => "Simulation Logic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Counterparty,
    Product,
    Direction,
    Amount,
}

impl Field {
    const ORDER: [Field; 4] = [Field::Counterparty, Field::Product, Field::Direction, Field::Amount];

    fn index(&self) -> usize {
        Field::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Field::ORDER[(self.index() + 1) % Field::ORDER.len()]
    }

    pub fn previous(&self) -> Self {
        Field::ORDER[(self.index() + Field::ORDER.len() - 1) % Field::ORDER.len()]
    }

    fn label(&self) -> &str {
        match self {
            Field::Counterparty => "Counterparty",
            Field::Product => "Product",
            Field::Direction => "Debit/Credit",
            Field::Amount => "Amount",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Form selections start empty, like unselected dropdowns
#[derive(Debug, Clone, Default)]
pub struct TransactionForm {
    pub counterparty: Option<usize>,
    pub product: Option<usize>,
    pub direction: Option<Direction>,
    pub amount: String,
}

pub struct App {
    pub engine: SimulationEngine,
    pub counterparties: Vec<String>,
    pub products: Vec<ProductType>,
    pub form: TransactionForm,
    pub focus: Field,
    pub current_page: Page,
    pub log_state: TableState,
    pub status: Status,
}

fn cycle(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        None if forward => 0,
        None => len - 1,
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
    })
}

impl App {
    pub fn new(engine: SimulationEngine) -> Self {
        let counterparties = engine.baseline().counterparties();
        let mut products = engine.baseline().products();
        // the form offers every product, balance-sheet ones first
        for product in ProductType::ALL {
            if !products.contains(&product) {
                products.push(product);
            }
        }

        Self {
            engine,
            counterparties,
            products,
            form: TransactionForm::default(),
            focus: Field::Counterparty,
            current_page: Page::Dashboard,
            log_state: TableState::default(),
            status: Status::Info("Fill in the form and press Enter to apply".to_string()),
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Step the focused selector through its options
    pub fn cycle_focused(&mut self, forward: bool) {
        match self.focus {
            Field::Counterparty => {
                self.form.counterparty = cycle(self.form.counterparty, self.counterparties.len(), forward)
            }
            Field::Product => self.form.product = cycle(self.form.product, self.products.len(), forward),
            Field::Direction => {
                self.form.direction = Some(match self.form.direction {
                    None => Direction::Debit,
                    Some(d) => d.toggle(),
                })
            }
            Field::Amount => {}
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.focus == Field::Amount && (c.is_ascii_digit() || c == '.' || c == '-') {
            self.form.amount.push(c);
        }
    }

    /// Delete one amount character, or clear the focused selector
    pub fn backspace(&mut self) {
        match self.focus {
            Field::Counterparty => self.form.counterparty = None,
            Field::Product => self.form.product = None,
            Field::Direction => self.form.direction = None,
            Field::Amount => {
                self.form.amount.pop();
            }
        }
    }

    fn request(&self) -> std::result::Result<TransactionRequest, String> {
        let amount = match self.form.amount.trim() {
            "" => None,
            text => Some(Decimal::from_str(text).map_err(|_| format!("Amount is not a number: {}", text))?),
        };

        Ok(TransactionRequest {
            counterparty: self.form.counterparty.and_then(|i| self.counterparties.get(i).cloned()),
            product: self
                .form
                .product
                .and_then(|i| self.products.get(i))
                .map(|p| p.as_str().to_string()),
            direction: self.form.direction.map(|d| d.as_str().to_string()),
            amount,
        })
    }

    /// Apply the form as a transaction; the form is kept for quick repeats
    pub fn submit(&mut self) {
        let request = match self.request() {
            Ok(request) => request,
            Err(message) => {
                self.status = Status::Error(message);
                return;
            }
        };

        match self.engine.apply(&request) {
            Ok(applied) => {
                self.status = Status::Info(format!(
                    "Applied #{}: {} → LCR {}%",
                    applied.record.sequence, applied.record.affected_category, applied.metrics.lcr_percent
                ));
                self.log_state.select(Some(self.engine.log().len() - 1));
            }
            Err(err) => self.status = Status::Error(err.to_string()),
        }
    }

    pub fn reset(&mut self) {
        let metrics = self.engine.reset();
        self.log_state.select(None);
        self.status = Status::Info(format!("Reset to baseline, LCR {}%", metrics.lcr_percent));
    }

    pub fn scroll_log(&mut self, down: bool) {
        let len = self.engine.log().len();
        if len == 0 {
            return;
        }
        let i = match self.log_state.selected() {
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.log_state.select(Some(i));
    }

    fn field_value(&self, field: Field) -> Option<String> {
        match field {
            Field::Counterparty => self.form.counterparty.and_then(|i| self.counterparties.get(i).cloned()),
            Field::Product => self.form.product.and_then(|i| self.products.get(i)).map(|p| p.to_string()),
            Field::Direction => self.form.direction.map(|d| d.to_string()),
            Field::Amount => Some(self.form.amount.clone()).filter(|a| !a.is_empty()),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
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
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Tab => app.next_page(),
                _ if app.current_page != Page::Dashboard => {}
                KeyCode::Enter => app.submit(),
                KeyCode::Char('r') => app.reset(),
                KeyCode::Down => app.focus_next(),
                KeyCode::Up => app.focus_previous(),
                KeyCode::Right => app.cycle_focused(true),
                KeyCode::Left => app.cycle_focused(false),
                KeyCode::Backspace => app.backspace(),
                KeyCode::PageDown => app.scroll_log(true),
                KeyCode::PageUp => app.scroll_log(false),
                KeyCode::Char(c) => app.input_char(c),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::SimulationLogic => render_logic(f, chunks[1]),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        "Treasury Dashboard  ",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];

    for (i, page) in [Page::Dashboard, Page::SimulationLogic].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    let (phase, color) = match app.engine.phase() {
        Phase::Baseline => ("BASELINE", Color::Green),
        Phase::Simulated => ("SIMULATED", Color::Magenta),
    };
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(phase, Style::default().fg(color).add_modifier(Modifier::BOLD)));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("{} simulations", app.engine.log().len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(10), // form + reference tables
            Constraint::Length(3),  // gauge
            Constraint::Min(0),     // simulation log
        ])
        .split(area);

    let top = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[0]);

    render_form(f, top[0], app);
    render_balance_sheet(f, top[1], app);
    render_metrics(f, top[2], &app.engine.metrics());
    render_gauge(f, rows[1], app.engine.metrics().lcr_percent);
    render_log(f, rows[2], app);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::from("")];

    for field in Field::ORDER {
        let focused = field == app.focus;
        let marker = if focused { "→ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };

        let value = match app.field_value(field) {
            Some(v) => Span::styled(v, Style::default().fg(Color::White)),
            None => Span::styled(
                format!("Select {}", field.label()),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        };

        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<14}", field.label()), label_style),
            value,
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" apply  "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" reset"),
    ]));

    f.render_widget(Paragraph::new(lines).block(bordered(" Transaction ")), area);
}

fn render_balance_sheet(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.engine.balance_sheet().iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.counterparty.clone()),
            Cell::from(entry.product.to_string()),
            Cell::from(format!("{:.2}", entry.amount)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Length(22), Constraint::Length(10)],
    )
    .header(header_row(&["Counterparty", "Product", "Amount"]))
    .block(bordered(" Balance Sheet "));

    f.render_widget(table, area);
}

fn render_metrics(f: &mut Frame, area: Rect, metrics: &LcrMetrics) {
    let rows = metrics.rows().into_iter().map(|(label, value)| {
        Row::new(vec![Cell::from(label), Cell::from(format!("{:.2}", value))])
    });

    let table = Table::new(rows, [Constraint::Length(33), Constraint::Length(10)])
        .header(header_row(&["Metric", "Value"]))
        .block(bordered(" LCR Metrics "));

    f.render_widget(table, area);
}

fn render_gauge(f: &mut Frame, area: Rect, lcr_percent: Decimal) {
    let value = lcr_percent.to_f64().unwrap_or(0.0);
    let ratio = (value / GAUGE_MAX).clamp(0.0, 1.0);
    let color = if value >= 100.0 { Color::Blue } else { Color::Red };

    let gauge = Gauge::default()
        .block(bordered(" Liquidity Coverage Ratio (LCR) % "))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{}%", lcr_percent));

    f.render_widget(gauge, area);
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Hqla => Color::Green,
        Category::Inflows => Color::Cyan,
        Category::Outflows => Color::Red,
    }
}

fn render_log(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.engine.log().iter().map(|record| {
        let color = category_color(record.affected_category);
        Row::new(vec![
            Cell::from(record.sequence.to_string()),
            Cell::from(record.counterparty.clone()),
            Cell::from(record.product.to_string()),
            Cell::from(format!("{:.2}", record.amount)),
            Cell::from(record.direction.to_string()),
            Cell::from(format!("{}", record.resulting_lcr_percent)),
            Cell::from(record.affected_category.to_string()).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Length(24),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(18),
        ],
    )
    .header(header_row(&[
        "#", "Counterparty", "Product", "Amount", "Debit/Credit", "New LCR %", "Affected Category",
    ]))
    .block(bordered(" Simulations "))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.log_state);
}

fn render_logic(f: &mut Frame, area: Rect) {
    let rows = impact_table().into_iter().map(|row| {
        Row::new(vec![
            Cell::from(row.product.to_string()),
            Cell::from(row.documented_debit),
            Cell::from(row.documented_credit),
            Cell::from(row.applied_debit.to_string()).style(Style::default().fg(category_color(row.applied_debit))),
            Cell::from(row.applied_credit.to_string()).style(Style::default().fg(category_color(row.applied_credit))),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(22),
            Constraint::Length(22),
            Constraint::Length(20),
            Constraint::Length(20),
        ],
    )
    .header(header_row(&[
        "Product",
        "Debit Impact on LCR",
        "Credit Impact on LCR",
        "Recorded on Debit",
        "Recorded on Credit",
    ]))
    .block(bordered(" Simulation Logic - documented vs recorded category "));

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![match &app.status {
        Status::Info(msg) => Span::styled(format!(" {} ", msg), Style::default().fg(Color::Green)),
        Status::Error(msg) => Span::styled(format!(" ✗ {} ", msg), Style::default().fg(Color::Red)),
    }];

    spans.push(Span::raw(" | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Field | "));
    spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Select | "));
    spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Page | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
