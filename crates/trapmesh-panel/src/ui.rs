//! Terminal UI for module monitoring and control.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Line as CanvasLine, Points},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Terminal,
};
use trapmesh_topology::{GraphRenderer, LayoutRenderer, NodeId};

use crate::form::{DebugMessage, SettingsUpdate, SnapshotRequest};
use crate::notify::NotificationKind;
use crate::panel::ControlPanel;
use crate::transport::Transport;

const COLOR_TEAL: Color = Color::Rgb(0, 168, 150);
const COLOR_GREEN: Color = Color::Rgb(46, 204, 113);
const COLOR_AMBER: Color = Color::Rgb(243, 156, 18);
const COLOR_RED: Color = Color::Rgb(231, 76, 60);
const COLOR_INFO: Color = Color::Rgb(142, 142, 147);
const COLOR_YELLOW: Color = Color::Rgb(245, 196, 66);
const COLOR_CYAN: Color = Color::Rgb(64, 212, 255);
const COLOR_NODE: Color = Color::Rgb(97, 125, 180);
const COLOR_PROMPT_BG: Color = Color::Rgb(24, 24, 24);

const LABEL_WIDTH: usize = 12;
const PICK_RADIUS: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelKind {
    Status,
    Nodes,
    Graph,
}

impl PanelKind {
    fn title(self) -> &'static str {
        match self {
            PanelKind::Status => "Status",
            PanelKind::Nodes => "Nodes",
            PanelKind::Graph => "Mesh Graph",
        }
    }
}

struct PromptLine {
    segments: Vec<(String, Style)>,
}

impl PromptLine {
    fn plain(text: impl Into<String>, style: Style) -> Self {
        Self {
            segments: vec![(text.into(), style)],
        }
    }
}

#[derive(Default)]
struct PromptState {
    active: bool,
    input: String,
    cursor: usize,
    history: Vec<String>,
    output: Vec<PromptLine>,
}

impl PromptState {
    fn activate(&mut self) {
        self.active = true;
        self.input.clear();
        self.cursor = 0;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.input.clear();
        self.cursor = 0;
    }

    fn set_output(&mut self, lines: Vec<PromptLine>) {
        self.output = lines;
    }

    /// Byte offset of the cursor, which counts characters.
    fn cursor_byte(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map_or(self.input.len(), |(offset, _)| offset)
    }

    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    fn insert(&mut self, ch: char) {
        let at = self.cursor_byte();
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.cursor_byte();
        self.input.remove(at);
    }
}

/// Graph panel geometry from the last frame, for mouse picking.
#[derive(Debug, Clone, Copy)]
struct GraphView {
    inner: Rect,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl GraphView {
    fn to_graph(self, column: u16, row: u16) -> Option<(f64, f64)> {
        let inner = self.inner;
        if inner.width == 0
            || inner.height == 0
            || column < inner.x
            || row < inner.y
            || column >= inner.x + inner.width
            || row >= inner.y + inner.height
        {
            return None;
        }
        let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
        let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
        let x = self.x_bounds[0] + fx * (self.x_bounds[1] - self.x_bounds[0]);
        let y = self.y_bounds[1] - fy * (self.y_bounds[1] - self.y_bounds[0]);
        Some((x, y))
    }
}

struct UiState {
    prompt: PromptState,
    alerts: VecDeque<PromptLine>,
    connected: bool,
    graph_view: Option<GraphView>,
    dragging: Option<NodeId>,
}

/// Commands accepted at the `:` prompt and bound to keys.
#[derive(Debug, Clone, PartialEq, Eq)]
enum UiCommand {
    Refresh,
    TimeSync,
    Config(SettingsUpdate),
    Message(DebugMessage),
    Snapshot(SnapshotRequest),
    GpsInit,
    GpsGet,
    Dismiss,
    Help,
    Quit,
}

/// Runs the panel until the user quits, refreshing every `refresh`.
pub fn run_ui<T: Transport>(
    panel: &mut ControlPanel<T>,
    refresh: Duration,
) -> anyhow::Result<()> {
    let mut state = UiState {
        prompt: PromptState::default(),
        alerts: VecDeque::with_capacity(6),
        connected: true,
        graph_view: None,
        dragging: None,
    };
    let mut last_refresh: Option<Instant> = None;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| {
        loop {
            if last_refresh.is_none_or(|at| at.elapsed() >= refresh) {
                refresh_panel(panel, &mut state);
                last_refresh = Some(Instant::now());
            }
            panel.renderer_mut().tick(Instant::now());

            let completed =
                terminal.draw(|frame| render_ui(frame.area(), frame, &state, panel))?;
            state.graph_view = Some(graph_view(completed.area, panel.renderer()));

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if handle_key(key, panel, &mut state) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => handle_mouse(mouse, panel, &mut state),
                    _ => {}
                }
            }
        }
        Ok(())
    })();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    result
}

fn refresh_panel<T: Transport>(panel: &mut ControlPanel<T>, state: &mut UiState) {
    match panel.refresh() {
        Ok(_) => {
            if !state.connected {
                push_alert(
                    state,
                    "CONNECTED Module reachable again.",
                    Style::default().fg(COLOR_GREEN),
                );
            }
            state.connected = true;
        }
        Err(err) => {
            if state.connected {
                push_alert(
                    state,
                    &format!("DISCONNECTED {err}"),
                    Style::default().fg(COLOR_AMBER),
                );
            }
            state.connected = false;
        }
    }
}

fn handle_key<T: Transport>(
    key: KeyEvent,
    panel: &mut ControlPanel<T>,
    state: &mut UiState,
) -> bool {
    if state.prompt.active {
        return handle_prompt_key(key, panel, state);
    }
    let command = match key.code {
        KeyCode::Char(':') | KeyCode::Char('/') => {
            state.prompt.activate();
            return false;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => UiCommand::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') => UiCommand::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => UiCommand::Refresh,
        KeyCode::Char('t') | KeyCode::Char('T') => UiCommand::TimeSync,
        KeyCode::Char('s') | KeyCode::Char('S') => {
            UiCommand::Snapshot(SnapshotRequest::default())
        }
        KeyCode::Char('g') => UiCommand::GpsInit,
        KeyCode::Char('G') => UiCommand::GpsGet,
        KeyCode::Char('?') => UiCommand::Help,
        KeyCode::Esc => UiCommand::Dismiss,
        _ => return false,
    };
    execute_command(command, panel, state)
}

fn handle_prompt_key<T: Transport>(
    key: KeyEvent,
    panel: &mut ControlPanel<T>,
    state: &mut UiState,
) -> bool {
    match key.code {
        KeyCode::Esc => {
            state.prompt.deactivate();
            state.prompt.output.clear();
        }
        KeyCode::Enter => {
            let input = state.prompt.input.trim().to_string();
            state.prompt.deactivate();
            if input.is_empty() {
                return false;
            }
            state.prompt.history.push(input.clone());
            match parse_command(&input) {
                Ok(command) => return execute_command(command, panel, state),
                Err(message) => state.prompt.set_output(vec![PromptLine::plain(
                    message,
                    Style::default().fg(COLOR_RED),
                )]),
            }
        }
        KeyCode::Backspace => state.prompt.backspace(),
        KeyCode::Left => {
            state.prompt.cursor = state.prompt.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            if state.prompt.cursor < state.prompt.char_count() {
                state.prompt.cursor += 1;
            }
        }
        KeyCode::Up => {
            if let Some(last) = state.prompt.history.last() {
                state.prompt.input = last.clone();
                state.prompt.cursor = state.prompt.char_count();
            }
        }
        KeyCode::Char(ch) if !ch.is_control() => state.prompt.insert(ch),
        _ => {}
    }
    false
}

fn handle_mouse<T: Transport>(
    mouse: MouseEvent,
    panel: &mut ControlPanel<T>,
    state: &mut UiState,
) {
    let Some(view) = state.graph_view else {
        return;
    };
    let position = view.to_graph(mouse.column, mouse.row);
    let renderer = panel.renderer_mut();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if !renderer.drag_enabled() {
                return;
            }
            let span =
                (view.x_bounds[1] - view.x_bounds[0]).max(view.y_bounds[1] - view.y_bounds[0]);
            let radius = span * PICK_RADIUS;
            state.dragging = position.and_then(|(x, y)| nearest_node(renderer, x, y, radius));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let (Some(id), Some((x, y))) = (state.dragging, position) {
                renderer.drag_node(id, x, y);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(id) = state.dragging.take() {
                renderer.release_node(id);
            }
        }
        _ => {}
    }
}

fn nearest_node(renderer: &LayoutRenderer, x: f64, y: f64, radius: f64) -> Option<NodeId> {
    renderer
        .graph()
        .nodes()
        .map(|node| (node.id, (node.x - x).hypot(node.y - y)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn execute_command<T: Transport>(
    command: UiCommand,
    panel: &mut ControlPanel<T>,
    state: &mut UiState,
) -> bool {
    let outcome = match command {
        UiCommand::Quit => return true,
        UiCommand::Help => {
            state.prompt.set_output(help_lines());
            return false;
        }
        UiCommand::Dismiss => {
            panel.notifications_mut().dismiss_all();
            state.prompt.output.clear();
            return false;
        }
        UiCommand::Refresh => {
            refresh_panel(panel, state);
            return false;
        }
        UiCommand::TimeSync => panel.sync_time().map(|_| ()),
        UiCommand::Config(update) => panel.apply_settings(update),
        UiCommand::Message(message) => panel.send_message(&message),
        UiCommand::Snapshot(request) => panel.snapshot(request).map(|_| ()),
        UiCommand::GpsInit => panel.init_gps(),
        UiCommand::GpsGet => panel.request_gps(),
    };
    // Failures already raised a popup; the prompt only echoes the outcome.
    let line = match outcome {
        Ok(()) => PromptLine::plain("done", Style::default().fg(COLOR_GREEN)),
        Err(err) => PromptLine::plain(err.to_string(), Style::default().fg(COLOR_RED)),
    };
    state.prompt.set_output(vec![line]);
    false
}

fn parse_command(input: &str) -> Result<UiCommand, String> {
    let input = input.trim().trim_start_matches([':', '/']);
    let mut parts = input.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = parts.collect();
    match head.to_ascii_lowercase().as_str() {
        "r" | "refresh" => Ok(UiCommand::Refresh),
        "t" | "time" => Ok(UiCommand::TimeSync),
        "config" | "set" => SettingsUpdate::parse_args(args.iter().copied())
            .map(UiCommand::Config)
            .map_err(|err| err.to_string()),
        "msg" | "message" => parse_message(&args).map(UiCommand::Message),
        "snap" | "snapshot" => match args.as_slice() {
            [] => Ok(UiCommand::Snapshot(SnapshotRequest::default())),
            [format] => format
                .parse::<u8>()
                .map(|format| UiCommand::Snapshot(SnapshotRequest { format: Some(format) }))
                .map_err(|_| format!("invalid picture format '{format}'")),
            _ => Err("usage: snap [format]".to_string()),
        },
        "gps" => match args.as_slice() {
            ["init"] => Ok(UiCommand::GpsInit),
            ["get"] | [] => Ok(UiCommand::GpsGet),
            _ => Err("usage: gps init|get".to_string()),
        },
        "dismiss" => Ok(UiCommand::Dismiss),
        "help" | "?" => Ok(UiCommand::Help),
        "q" | "quit" | "exit" => Ok(UiCommand::Quit),
        other => Err(format!("unknown command '{other}' (try help)")),
    }
}

/// `msg <text...> [node]`; a trailing number addresses a single node.
fn parse_message(args: &[&str]) -> Result<DebugMessage, String> {
    let (words, target) = match args {
        [] => return Err("usage: msg <text> [node]".to_string()),
        [words @ .., last] if !words.is_empty() => match last.parse::<u32>() {
            Ok(node) => (words, Some(node)),
            Err(_) => (args, None),
        },
        _ => (args, None),
    };
    Ok(DebugMessage {
        content: words.join(" "),
        target,
    })
}

fn help_lines() -> Vec<PromptLine> {
    [
        ("r", "refresh status and mesh graph"),
        ("t", "sync module time"),
        ("s", "take a snapshot"),
        ("g / G", "reset GPS / request GPS fix"),
        (":config", "work=<min> mode=set|trap start=<h> end=<h>"),
        (":msg", "<text> [node]"),
        (":snap", "[format]"),
        ("Esc", "dismiss popups"),
        ("q", "quit"),
    ]
    .into_iter()
    .map(|(key, text)| PromptLine {
        segments: vec![
            (format!("{key:<10}"), label_style()),
            (text.to_string(), value_style()),
        ],
    })
    .collect()
}

struct Areas {
    status: Rect,
    nodes: Rect,
    graph: Rect,
    prompt: Rect,
}

fn split_areas(area: Rect, prompt_height: u16) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(area.height.saturating_sub(prompt_height)),
            Constraint::Length(prompt_height),
        ])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(cols[0]);
    Areas {
        status: left[0],
        nodes: left[1],
        graph: cols[1],
        prompt: rows[1],
    }
}

fn prompt_height(area: Rect) -> u16 {
    // Alerts, popups, one output line and the input row.
    8.min(area.height.saturating_sub(8)).max(3)
}

fn render_ui<T: Transport>(
    area: Rect,
    frame: &mut ratatui::Frame<'_>,
    state: &UiState,
    panel: &ControlPanel<T>,
) {
    let areas = split_areas(area, prompt_height(area));
    render_status_panel(areas.status, frame, panel);
    render_nodes_panel(areas.nodes, frame, panel);
    render_graph_panel(areas.graph, frame, panel.renderer());
    render_prompt(areas.prompt, frame, state, panel);
}

fn render_status_panel<T: Transport>(
    area: Rect,
    frame: &mut ratatui::Frame<'_>,
    panel: &ControlPanel<T>,
) {
    let status = panel.status();
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let mut lines = Vec::new();
    let chip = mode_chip(status.trap_mode.as_deref());
    lines.push(Line::from(vec![
        Span::styled(chip.0, chip.1),
        Span::raw(" "),
        Span::styled(format!("Node {}", text(&status.node_id)), value_style()),
    ]));
    lines.push(label_value_line("Parent", &text(&status.parent_node_id), value_style()));
    lines.push(label_value_line("Is parent", &text(&status.is_parent), value_style()));
    let fire_style = match status.trap_fire.as_deref() {
        Some("Fired") => Style::default().fg(COLOR_RED).add_modifier(Modifier::BOLD),
        _ => value_style(),
    };
    lines.push(label_value_line("Trap", &text(&status.trap_fire), fire_style));
    if let Some(message) = status.trap_fire_message.as_deref().filter(|m| !m.is_empty()) {
        lines.push(label_value_line("Fire msg", message, value_style()));
    }
    let battery_style = match status.battery_dead.as_deref() {
        Some("true") | Some("1") => Style::default().fg(COLOR_RED),
        _ => value_style(),
    };
    lines.push(label_value_line("Battery dead", &text(&status.battery_dead), battery_style));
    lines.push(label_value_line(
        "Work time",
        &status
            .work_time
            .as_deref()
            .map(|minutes| format!("{minutes} min"))
            .unwrap_or_else(|| "-".to_string()),
        value_style(),
    ));
    lines.push(label_value_line(
        "Active",
        &format!("{} - {}", text(&status.active_start), text(&status.active_end)),
        value_style(),
    ));
    let clock = panel.clock().text();
    lines.push(label_value_line(
        "Module time",
        if clock.is_empty() { "-" } else { clock.as_str() },
        value_style(),
    ));
    lines.push(label_value_line(
        "GPS",
        &format!("{}, {}", text(&status.gps_lat), text(&status.gps_lon)),
        value_style(),
    ));
    if let Some(link) = status.map_link.as_deref() {
        lines.push(label_value_line("Map", link, Style::default().fg(COLOR_CYAN)));
    }
    lines.push(label_value_line(
        "Camera",
        if status.camera_visible { "enabled" } else { "disabled" },
        value_style(),
    ));
    if status.camera_visible {
        lines.push(label_value_line("Picture", &text(&status.picture), value_style()));
    }
    let block = panel_block(PanelKind::Status, None);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_nodes_panel<T: Transport>(
    area: Rect,
    frame: &mut ratatui::Frame<'_>,
    panel: &ControlPanel<T>,
) {
    let nodes = &panel.status().node_list;
    let lines: Vec<Line> = if nodes.is_empty() {
        vec![Line::from(Span::styled(
            "No nodes reported",
            Style::default().fg(COLOR_INFO),
        ))]
    } else {
        nodes
            .iter()
            .map(|node| {
                Line::from(vec![
                    Span::styled("- ", label_style()),
                    Span::styled(node.clone(), value_style()),
                ])
            })
            .collect()
    };
    let block = panel_block(PanelKind::Nodes, Some(nodes.len().to_string()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn graph_bounds(renderer: &LayoutRenderer) -> ([f64; 2], [f64; 2]) {
    let Some((min_x, max_x, min_y, max_y)) = renderer.bounds() else {
        return ([0.0, 1.0], [0.0, 1.0]);
    };
    let pad_x = ((max_x - min_x) * 0.1).max(0.05);
    let pad_y = ((max_y - min_y) * 0.1).max(0.05);
    ([min_x - pad_x, max_x + pad_x], [min_y - pad_y, max_y + pad_y])
}

fn graph_view(frame_area: Rect, renderer: &LayoutRenderer) -> GraphView {
    let areas = split_areas(frame_area, prompt_height(frame_area));
    let inner = Block::default().borders(Borders::ALL).inner(areas.graph);
    let (x_bounds, y_bounds) = graph_bounds(renderer);
    GraphView {
        inner,
        x_bounds,
        y_bounds,
    }
}

fn render_graph_panel(area: Rect, frame: &mut ratatui::Frame<'_>, renderer: &LayoutRenderer) {
    let graph = renderer.graph();
    let state = if renderer.is_layout_running() {
        "settling"
    } else {
        "settled"
    };
    let suffix = format!("{} nodes, {} edges, {state}", graph.node_count(), graph.edge_count());
    let block = panel_block(PanelKind::Graph, Some(suffix));
    if graph.is_empty() {
        let hint = Line::from(Span::styled("No mesh graph yet", Style::default().fg(COLOR_INFO)));
        frame.render_widget(Paragraph::new(hint).block(block), area);
        return;
    }
    let (x_bounds, y_bounds) = graph_bounds(renderer);
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for edge in graph.edges() {
                let (Some(source), Some(target)) =
                    (graph.node(edge.source), graph.node(edge.target))
                else {
                    continue;
                };
                ctx.draw(&CanvasLine {
                    x1: source.x,
                    y1: source.y,
                    x2: target.x,
                    y2: target.y,
                    color: COLOR_INFO,
                });
            }
            let coords: Vec<(f64, f64)> = graph.nodes().map(|node| (node.x, node.y)).collect();
            ctx.draw(&Points {
                coords: &coords,
                color: COLOR_NODE,
            });
            ctx.layer();
            for node in graph.nodes() {
                let style = if node.id.is_root() {
                    Style::default().fg(COLOR_YELLOW).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(COLOR_CYAN)
                };
                ctx.print(node.x, node.y, Line::from(Span::styled(node.label.clone(), style)));
            }
        });
    frame.render_widget(canvas, area);
}

fn render_prompt<T: Transport>(
    area: Rect,
    frame: &mut ratatui::Frame<'_>,
    state: &UiState,
    panel: &ControlPanel<T>,
) {
    let mut lines: Vec<Line> = Vec::new();
    for notification in panel.notifications().visible() {
        let color = match notification.kind {
            NotificationKind::Success => COLOR_GREEN,
            NotificationKind::Failure => COLOR_RED,
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}]", notification.kind.title()),
                Style::default().bg(color).fg(Color::Black).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(notification.message.clone(), Style::default().fg(color)),
        ]));
    }
    for alert in state.alerts.iter().rev().take(2) {
        lines.push(prompt_line_to_line(alert));
    }
    for line in &state.prompt.output {
        lines.push(prompt_line_to_line(line));
    }
    let output_height = area.height.saturating_sub(1);
    let output_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: output_height,
    };
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), output_area);

    let prompt_area = Rect {
        x: area.x,
        y: area.y + output_height,
        width: area.width,
        height: 1,
    };
    if state.prompt.active {
        let prompt = Line::from(vec![
            Span::styled(":", Style::default().fg(COLOR_TEAL).add_modifier(Modifier::BOLD)),
            Span::raw(state.prompt.input.clone()),
        ]);
        frame.render_widget(
            Paragraph::new(prompt).style(Style::default().bg(COLOR_PROMPT_BG)),
            prompt_area,
        );
        let typed: String = state.prompt.input.chars().take(state.prompt.cursor).collect();
        let offset = u16::try_from(Span::raw(typed).width()).unwrap_or(u16::MAX);
        let cursor_x = prompt_area.x.saturating_add(1).saturating_add(offset);
        frame.set_cursor_position((cursor_x.min(prompt_area.right()), prompt_area.y));
    } else {
        let hint = Line::from(Span::styled(
            "r refresh  t time  s snapshot  g/G gps  : command  Esc dismiss  q quit",
            Style::default()
                .fg(COLOR_INFO)
                .add_modifier(Modifier::DIM)
                .bg(COLOR_PROMPT_BG),
        ));
        frame.render_widget(
            Paragraph::new(hint).style(Style::default().bg(COLOR_PROMPT_BG)),
            prompt_area,
        );
    }
}

fn prompt_line_to_line(line: &PromptLine) -> Line<'_> {
    let spans = line
        .segments
        .iter()
        .map(|(text, style)| Span::styled(text.clone(), *style))
        .collect::<Vec<_>>();
    Line::from(spans)
}

fn panel_block(kind: PanelKind, suffix: Option<String>) -> Block<'static> {
    let title = match suffix {
        Some(suffix) => format!(" {} ({suffix}) ", kind.title()),
        None => format!(" {} ", kind.title()),
    };
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(COLOR_YELLOW)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(COLOR_INFO))
}

fn label_style() -> Style {
    Style::default().fg(COLOR_CYAN)
}

fn value_style() -> Style {
    Style::default().fg(Color::White)
}

fn label_value_line(label: &str, value: &str, value_style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<LABEL_WIDTH$}"), label_style()),
        Span::raw(" "),
        Span::styled(value.to_string(), value_style),
    ])
}

fn mode_chip(mode: Option<&str>) -> (String, Style) {
    let (label, bg, fg) = match mode {
        Some("Trap Mode") => ("TRAP", COLOR_TEAL, Color::White),
        Some("Set Mode") => ("SET", COLOR_AMBER, Color::Black),
        _ => ("UNKNOWN", Color::DarkGray, Color::White),
    };
    (
        format!("[{label}]"),
        Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD),
    )
}

fn push_alert(state: &mut UiState, text: &str, style: Style) {
    if state.alerts.len() > 4 {
        state.alerts.pop_front();
    }
    state
        .alerts
        .push_back(PromptLine::plain(text.to_string(), style));
}
