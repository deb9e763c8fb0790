use campaign_map::aggregate::BuildingMatch;
use campaign_map::controller::{
    markers, DayData, DayNavigator, DayRequest, DaySelection, DayView, Marker, MarkerKind,
};
use campaign_map::events::EventEntry;
use campaign_map::map::{DisplayBounds, OverlayRenderer, SpatialGrid, Viewport, WorldTransform};
use campaign_map::model::{owner_label, DateTime, World};
use campaign_map::timeline::{self, Series, TimelineDay};
use ratatui::layout::Rect;

/// Results of background fetches, delivered to the event loop
pub enum Fetched {
    World { world: World, dates: Vec<DateTime> },
    Day { request: DayRequest, data: DayData },
    Timeline(Vec<TimelineDay>),
    SyncState(String),
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Map,
    Graph,
}

/// List that receives cursor keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Days,
    Events,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<String>,
    /// Map cell the popup points at
    pub anchor: (u16, u16),
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub renderer: OverlayRenderer,
    /// Inner area of the map block, in terminal cells
    pub map_area: Rect,
    pub world: Option<World>,
    transform: WorldTransform,
    pub dates: Vec<DateTime>,
    pub markers: Vec<Marker>,
    marker_grid: SpatialGrid<usize>,
    pub navigator: DayNavigator,
    /// Overlays of the displayed day, replaced as a whole
    pub view: DayView,
    matching: BuildingMatch,
    pub day_cursor: usize,
    pub event_cursor: usize,
    pub focus: Focus,
    pub screen: Screen,
    pub popup: Option<Popup>,
    pub timeline: Option<Vec<Series>>,
    pub timeline_loading: bool,
    pub sync_state: Option<String>,
    pub message: Option<String>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    /// Click tolerance around markers, in braille pixels
    const PICK_RADIUS_PX: f64 = 6.0;

    pub fn new(map_area: Rect, matching: BuildingMatch) -> Self {
        let (width, height) = (map_area.width as usize * 2, map_area.height as usize * 4);
        Self {
            viewport: Viewport::world(width, height),
            renderer: OverlayRenderer::new(),
            map_area,
            world: None,
            transform: WorldTransform::Identity,
            dates: Vec::new(),
            markers: Vec::new(),
            marker_grid: SpatialGrid::new(1.0),
            navigator: DayNavigator::new(0),
            view: DayView::default(),
            matching,
            day_cursor: 0,
            event_cursor: 0,
            focus: Focus::Days,
            screen: Screen::Map,
            popup: None,
            timeline: None,
            timeline_loading: false,
            sync_state: None,
            message: Some("Loading campaign...".to_string()),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
        }
    }

    /// Handle a fetch result. Returns a day to fetch next, if any.
    pub fn apply(&mut self, fetched: Fetched) -> Option<DayRequest> {
        match fetched {
            Fetched::World { world, dates } => return self.set_world(world, dates),
            Fetched::Day { request, data } => {
                self.apply_day(request, data);
            }
            Fetched::Timeline(days) => {
                self.timeline = Some(timeline::series(&days));
                self.timeline_loading = false;
            }
            Fetched::SyncState(state) => self.sync_state = Some(state),
            Fetched::Failed(message) => {
                self.timeline_loading = false;
                self.message = Some(message);
            }
        }
        None
    }

    /// Install the campaign topology and request the latest day
    pub fn set_world(&mut self, world: World, dates: Vec<DateTime>) -> Option<DayRequest> {
        self.transform = WorldTransform::for_world(&world);
        self.markers = markers(&world, &self.transform);

        let bounds = self
            .transform
            .display_bounds()
            .or_else(|| marker_bounds(&self.markers));
        let cell = bounds
            .map(|b| ((b.north - b.south).abs().max((b.east - b.west).abs()) / 64.0).max(1e-6))
            .unwrap_or(1.0);
        self.marker_grid = SpatialGrid::new(cell);
        for (idx, marker) in self.markers.iter().enumerate() {
            self.marker_grid.insert(marker.at, idx);
        }
        if let Some(bounds) = bounds {
            self.viewport = Viewport::fit(bounds, self.viewport.width, self.viewport.height);
        }

        tracing::info!(
            map = %world.map,
            regions = world.regions.len(),
            airfields = world.airfields.len(),
            days = dates.len(),
            "Campaign loaded"
        );
        self.navigator = DayNavigator::new(dates.len());
        self.dates = dates;
        self.world = Some(world);
        self.view = DayView::default();
        self.timeline = None;
        self.message = None;
        self.select_day(DaySelection::Latest)
    }

    pub fn select_day(&mut self, selection: DaySelection) -> Option<DayRequest> {
        match self.navigator.select(selection) {
            Ok(request) => {
                self.day_cursor = request.day;
                self.message = Some(format!("Loading {}...", self.date_label(request.day)));
                Some(request)
            }
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    pub fn select_cursor_day(&mut self) -> Option<DayRequest> {
        self.select_day(DaySelection::Day(self.day_cursor))
    }

    /// Replace the displayed day, unless a newer selection superseded it
    pub fn apply_day(&mut self, request: DayRequest, data: DayData) -> bool {
        if !self.navigator.complete(&request) {
            return false;
        }
        let Some(world) = &self.world else {
            return false;
        };
        self.message = if data.state.is_none() {
            Some(format!("No war state for {}", self.date_label(request.day)))
        } else {
            None
        };
        self.view = DayView::build(world, &self.transform, &data, self.matching);
        self.event_cursor = 0;
        self.popup = None;
        true
    }

    pub fn date_label(&self, day: usize) -> String {
        self.dates
            .get(day)
            .map(|d| d.to_string())
            .unwrap_or_else(|| format!("day {}", day))
    }

    pub fn selected_event(&self) -> Option<&EventEntry> {
        self.view.events.get(self.event_cursor)
    }

    /// Move the cursor of the focused list
    pub fn move_cursor(&mut self, delta: i32) {
        let (cursor, len) = match self.focus {
            Focus::Days => (&mut self.day_cursor, self.dates.len()),
            Focus::Events => (&mut self.event_cursor, self.view.events.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = (*cursor as i64 + delta as i64).clamp(0, len as i64 - 1) as usize;
    }

    /// Step the displayed day and load it
    pub fn step_day(&mut self, delta: i32) -> Option<DayRequest> {
        if self.dates.is_empty() {
            return None;
        }
        let current = self.navigator.displayed_day().unwrap_or(self.day_cursor) as i64;
        let day = (current + delta as i64).clamp(0, self.dates.len() as i64 - 1) as usize;
        self.select_day(DaySelection::Day(day))
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Days => Focus::Events,
            Focus::Events => Focus::Days,
        };
    }

    /// Switch between map and graph. Returns true when the graph has to be
    /// fetched.
    pub fn toggle_screen(&mut self) -> bool {
        self.screen = match self.screen {
            Screen::Map => Screen::Graph,
            Screen::Graph => Screen::Map,
        };
        let needs_fetch =
            self.screen == Screen::Graph && self.timeline.is_none() && !self.timeline_loading;
        if needs_fetch && self.world.is_some() {
            self.timeline_loading = true;
            return true;
        }
        false
    }

    pub fn matching(&self) -> BuildingMatch {
        self.matching
    }

    pub fn set_map_area(&mut self, area: Rect) {
        self.map_area = area;
        self.viewport.width = area.width as usize * 2;
        self.viewport.height = area.height as usize * 4;
    }

    /// Braille pixel under a terminal cell, if the cell is on the map
    pub fn pixel_at(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height
        {
            return None;
        }
        Some((((col - area.x) as i32) * 2, ((row - area.y) as i32) * 4))
    }

    /// Open the popup of the marker under a click, or close the current one
    pub fn click(&mut self, col: u16, row: u16) {
        let Some((px, py)) = self.pixel_at(col, row) else {
            return;
        };
        let at = self.viewport.unproject(px, py);
        let radius = self.viewport.pixels_to_degrees(Self::PICK_RADIUS_PX);
        let hit = self
            .marker_grid
            .nearest(at, radius)
            .and_then(|&idx| self.markers.get(idx));

        self.popup = hit.map(|marker| {
            let kind = match marker.kind {
                MarkerKind::Region => "Region",
                MarkerKind::Airfield => "Airfield",
            };
            let lines = self
                .view
                .popup(marker)
                .map(<[String]>::to_vec)
                .unwrap_or_else(|| vec!["no data for this day".to_string()]);
            Popup {
                title: format!("{} {} ({})", kind, marker.id, owner_label(marker.owner)),
                lines,
                anchor: (col - self.map_area.x, row - self.map_area.y),
            }
        });
    }

    pub fn close_popup(&mut self) -> bool {
        self.popup.take().is_some()
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.pixel_at(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.pixel_at(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Fit the whole campaign map again
    pub fn reset_view(&mut self) {
        let bounds = self
            .transform
            .display_bounds()
            .or_else(|| marker_bounds(&self.markers));
        self.viewport = match bounds {
            Some(bounds) => Viewport::fit(bounds, self.viewport.width, self.viewport.height),
            None => Viewport::world(self.viewport.width, self.viewport.height),
        };
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Scale based on zoom: less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.and_then(|(col, row)| self.pixel_at(col, row))
    }
}

/// Bounding box of all markers, for maps without known display bounds
fn marker_bounds(markers: &[Marker]) -> Option<DisplayBounds> {
    let first = markers.first()?;
    let mut bounds = DisplayBounds::new(first.at.lat, first.at.lon, first.at.lat, first.at.lon);
    for m in markers {
        bounds.south = bounds.south.min(m.at.lat);
        bounds.north = bounds.north.max(m.at.lat);
        bounds.west = bounds.west.min(m.at.lon);
        bounds.east = bounds.east.max(m.at.lon);
    }
    Some(bounds)
}
