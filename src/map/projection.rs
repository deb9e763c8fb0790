use super::transform::{DisplayBounds, DisplayCoord};

/// Viewport over the display plane. The display system is plate carrée, so
/// latitude and longitude scale linearly onto pixels.
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude
    pub center_lon: f64,
    /// Center latitude
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Degrees of longitude spanning the canvas width at zoom 1
    pub span: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    const MIN_ZOOM: f64 = 0.5;
    const MAX_ZOOM: f64 = 64.0;

    pub fn new(center: DisplayCoord, span: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon: center.lon,
            center_lat: center.lat,
            zoom: 1.0,
            span: span.max(f64::EPSILON),
            width,
            height,
        }
    }

    /// Whole-globe view, used before the world is known
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(DisplayCoord::default(), 360.0, width, height)
    }

    /// View that shows the given bounds entirely
    pub fn fit(bounds: DisplayBounds, width: usize, height: usize) -> Self {
        let lon_span = (bounds.east - bounds.west).abs();
        let lat_span = (bounds.north - bounds.south).abs();
        // Pixels are square, so the taller of the two spans wins
        let aspect = width.max(1) as f64 / height.max(1) as f64;
        let span = lon_span.max(lat_span * aspect) * 1.05;
        Self::new(bounds.center(), span, width, height)
    }

    /// Degrees per pixel at the current zoom
    fn scale(&self) -> f64 {
        self.span / (self.zoom * self.width.max(1) as f64)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale;
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(Self::MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(Self::MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        // Keep the point under the cursor fixed
        let anchor = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        let scale = self.scale();
        self.center_lon = anchor.lon - (px as f64 - self.width as f64 / 2.0) * scale;
        self.center_lat = anchor.lat + (py as f64 - self.height as f64 / 2.0) * scale;
    }

    /// Pixel coordinates back to display coordinates
    pub fn unproject(&self, px: i32, py: i32) -> DisplayCoord {
        let scale = self.scale();
        DisplayCoord {
            lon: self.center_lon + (px as f64 - self.width as f64 / 2.0) * scale,
            lat: self.center_lat - (py as f64 - self.height as f64 / 2.0) * scale,
        }
    }

    /// Display coordinates to pixel coordinates
    pub fn project(&self, coord: DisplayCoord) -> (i32, i32) {
        let scale = self.scale();
        let px = (coord.lon - self.center_lon) / scale + self.width as f64 / 2.0;
        let py = (self.center_lat - coord.lat) / scale + self.height as f64 / 2.0;
        (px.round() as i32, py.round() as i32)
    }

    /// Radius in display degrees covered by `pixels` at the current zoom
    pub fn pixels_to_degrees(&self, pixels: f64) -> f64 {
        pixels * self.scale()
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }
}
