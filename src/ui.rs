use crate::app::{App, Focus, Popup, Screen};
use campaign_map::braille::BrailleCanvas;
use campaign_map::map::OverlayLayers;
use campaign_map::model::Coalition;
use campaign_map::timeline::{self, Series};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Widget, Wrap,
    },
    Frame,
};

const SIDE_PANEL_WIDTH: u16 = 44;

fn owner_color(owner: Option<Coalition>) -> Color {
    match owner {
        Some(Coalition::Allies) => Color::Red,
        Some(Coalition::Axis) => Color::Blue,
        None => Color::DarkGray,
    }
}

/// Main area and status bar
fn split_screen(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Map block and side panel
fn split_main(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Inner area of the map block for a terminal of the given size
pub fn map_inner(area: Rect) -> Rect {
    let (main, _) = split_screen(area);
    let (map, _) = split_main(main);
    Block::default().borders(Borders::ALL).inner(map)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let (main, status) = split_screen(frame.area());
    let (left, side) = split_main(main);

    match app.screen {
        Screen::Map => render_map(frame, app, left),
        Screen::Graph => render_graph(frame, app, left),
    }
    render_side_panel(frame, app, side);
    render_status_bar(frame, app, status);
}

fn titled_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.world {
        Some(world) if !world.scenario.is_empty() => format!("{} ({})", world.scenario, world.map),
        Some(world) => world.map.clone(),
        None => "Campaign".to_string(),
    };
    let block = titled_block(&title, false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.view,
        &app.markers,
    );

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);

    if let Some(popup) = &app.popup {
        render_popup(frame, popup, inner);
    }
}

/// Braille overlays with marker labels on top
struct MapWidget {
    layers: OverlayLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..(area.height as usize).min(canvas.height()) {
            for col in 0..(area.width as usize).min(canvas.width()) {
                if let Some(ch) = canvas.cell(col, row) {
                    let (x, y) = (area.x + col as u16, area.y + row as u16);
                    buf[(x, y)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Neutral at the back, coalitions on top
        Self::render_layer(&self.layers.neutral, owner_color(None), area, buf);
        Self::render_layer(&self.layers.axis, owner_color(Some(Coalition::Axis)), area, buf);
        Self::render_layer(&self.layers.allies, owner_color(Some(Coalition::Allies)), area, buf);

        for label in &self.layers.labels {
            if label.y >= area.height || label.x >= area.width {
                continue;
            }
            let style = Style::default().fg(match label.owner {
                None => Color::Gray,
                owner => owner_color(owner),
            });
            let max_len = area.width.saturating_sub(label.x) as usize;
            for (i, ch) in label.text.chars().take(max_len.min(16)).enumerate() {
                buf[(area.x + label.x + i as u16, area.y + label.y)]
                    .set_char(ch)
                    .set_style(style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Yellow);
        }
    }
}

fn render_popup(frame: &mut Frame, popup: &Popup, map: Rect) {
    let width = popup
        .lines
        .iter()
        .map(|l| l.chars().count())
        .chain(std::iter::once(popup.title.chars().count()))
        .max()
        .unwrap_or(0) as u16
        + 4;
    let height = popup.lines.len() as u16 + 2;
    let width = width.min(map.width);
    let height = height.min(map.height);

    // Prefer the right of the anchor, flip left near the edge
    let (ax, ay) = popup.anchor;
    let x = if ax + 2 + width <= map.width {
        ax + 2
    } else {
        ax.saturating_sub(width + 1)
    };
    let y = ay.min(map.height.saturating_sub(height));
    let area = Rect::new(map.x + x, map.y + y, width, height);

    let lines: Vec<Line> = popup
        .lines
        .iter()
        .map(|l| Line::from(format!("• {}", l)))
        .collect();
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(titled_block(&popup.title, true)),
        area,
    );
}

const SERIES_COLORS: [(Color, Color); 8] = [
    (Color::Blue, Color::Red),
    (Color::LightBlue, Color::LightRed),
    (Color::Cyan, Color::Magenta),
    (Color::Green, Color::Yellow),
    (Color::LightGreen, Color::LightYellow),
    (Color::LightCyan, Color::LightMagenta),
    (Color::Gray, Color::White),
    (Color::DarkGray, Color::Rgb(255, 165, 0)),
];

fn series_color(series: &Series, idx: usize) -> Color {
    let (axis, allies) = SERIES_COLORS[(idx / 2) % SERIES_COLORS.len()];
    match series.coalition {
        Coalition::Axis => axis,
        Coalition::Allies => allies,
    }
}

fn render_graph(frame: &mut Frame, app: &App, area: Rect) {
    let block = titled_block("Campaign timeline", false);
    let Some(series) = &app.timeline else {
        let text = if app.timeline_loading {
            "Fetching every campaign day..."
        } else {
            "No timeline"
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    };

    let max_x = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(x, _)| *x))
        .fold(0.0, f64::max);
    let max_y = timeline::max_value(series).max(1.0);

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            Dataset::default()
                .name(s.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(s, idx)))
                .data(&s.points)
        })
        .collect();

    let first = app.dates.first().map(|d| d.to_string()).unwrap_or_default();
    let last = app.dates.last().map(|d| d.to_string()).unwrap_or_default();
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("day")
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_x.max(1.0)])
                .labels([Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_y * 1.05])
                .labels([Span::raw("0"), Span::raw(format!("{:.0}", max_y))]),
        )
        .hidden_legend_constraints((Constraint::Percentage(60), Constraint::Percentage(80)));
    frame.render_widget(chart, area);
}

fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Min(4),
        ])
        .split(area);

    // Days
    let displayed = app.navigator.displayed_day();
    let days: Vec<ListItem> = app
        .dates
        .iter()
        .enumerate()
        .map(|(idx, date)| {
            let style = if Some(idx) == displayed {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(date.to_string(), style))
        })
        .collect();
    let mut day_state = ListState::default().with_selected(Some(app.day_cursor));
    frame.render_stateful_widget(
        List::new(days)
            .block(titled_block("Days", app.focus == Focus::Days))
            .highlight_style(Style::default().bg(Color::DarkGray)),
        chunks[0],
        &mut day_state,
    );

    // Events, alternating shade like the entries of a list group
    let events: Vec<ListItem> = app
        .view
        .events
        .iter()
        .enumerate()
        .map(|(idx, event)| {
            let fg = if idx % 2 == 1 { Color::Gray } else { Color::White };
            ListItem::new(Span::styled(event.description.clone(), Style::default().fg(fg)))
        })
        .collect();
    let mut event_state = ListState::default();
    if !app.view.events.is_empty() {
        event_state.select(Some(app.event_cursor));
    }
    frame.render_stateful_widget(
        List::new(events)
            .block(titled_block("Events", app.focus == Focus::Events))
            .highlight_style(Style::default().bg(Color::DarkGray)),
        chunks[1],
        &mut event_state,
    );

    // Properties of the selected event
    let mut lines = Vec::new();
    if let Some(event) = app.selected_event() {
        for cmd in &event.commands {
            lines.push(Line::from(Span::styled(
                cmd.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            if !cmd.detail.is_empty() {
                lines.push(Line::from(format!("  {}", cmd.detail)));
            }
        }
        for result in &event.results {
            lines.push(Line::from(Span::styled(
                format!("→ {}", result.title),
                Style::default().fg(Color::Cyan),
            )));
            if !result.detail.is_empty() {
                lines.push(Line::from(format!("  {}", result.detail)));
            }
        }
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(titled_block("Properties", false)),
        chunks[2],
    );
}

fn toggle_span(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.renderer.settings;
    let day = app
        .navigator
        .displayed_day()
        .map(|d| app.date_label(d))
        .unwrap_or_else(|| "-".to_string());

    let mut spans = vec![
        Span::styled(" Day: ", Style::default().fg(Color::DarkGray)),
        Span::styled(day, Style::default().fg(Color::Yellow)),
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        toggle_span(settings.show_borders, "[B]orders ", "[b]orders "),
        toggle_span(settings.show_markers, "[M]arkers ", "[m]arkers "),
        toggle_span(settings.show_labels, "[L]abels ", "[l]abels "),
    ];
    if app.navigator.displayed_day().is_some() {
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        for ((label, count), owner) in app.view.owner_counts().into_iter().zip([
            Some(Coalition::Allies),
            Some(Coalition::Axis),
            None,
        ]) {
            spans.push(Span::styled(
                format!("{} {} ", label, count),
                Style::default().fg(owner_color(owner)),
            ));
        }
    }
    if let Some(sync) = &app.sync_state {
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(sync.clone(), Style::default().fg(Color::Cyan)));
        spans.push(Span::raw(" "));
    }
    if let Some(message) = &app.message {
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Magenta)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        "| tab:focus j/k:move enter:load n/p:day g:graph s:sync q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
