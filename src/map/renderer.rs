use crate::braille::BrailleCanvas;
use crate::controller::{DayView, Marker, MarkerKind};
use crate::map::geometry::{draw_cross, draw_diamond, draw_polyline};
use crate::map::projection::Viewport;
use crate::model::Coalition;

/// Display settings for overlay layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_markers: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_markers: true,
            show_labels: true,
        }
    }
}

/// Label in character coordinates of the map area
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
    pub owner: Option<Coalition>,
}

/// Separate canvases per owner so each can be drawn in its own colour
pub struct OverlayLayers {
    pub allies: BrailleCanvas,
    pub axis: BrailleCanvas,
    pub neutral: BrailleCanvas,
    pub labels: Vec<Label>,
}

impl OverlayLayers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            allies: BrailleCanvas::new(width, height),
            axis: BrailleCanvas::new(width, height),
            neutral: BrailleCanvas::new(width, height),
            labels: Vec::new(),
        }
    }

    pub fn layer_mut(&mut self, owner: Option<Coalition>) -> &mut BrailleCanvas {
        match owner {
            Some(Coalition::Allies) => &mut self.allies,
            Some(Coalition::Axis) => &mut self.axis,
            None => &mut self.neutral,
        }
    }
}

/// Draws a day's borders and the fixed markers onto braille layers
#[derive(Default)]
pub struct OverlayRenderer {
    pub settings: DisplaySettings,
}

impl OverlayRenderer {
    /// Zoom from which marker ids are printed next to the markers
    const LABEL_ZOOM: f64 = 2.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Render into layers of `width` x `height` characters
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        view: &DayView,
        markers: &[Marker],
    ) -> OverlayLayers {
        let mut layers = OverlayLayers::new(width, height);

        if self.settings.show_borders {
            for border in &view.borders {
                let points: Vec<(i32, i32)> =
                    border.ring.iter().map(|&c| viewport.project(c)).collect();
                draw_polyline(layers.layer_mut(border.owner), &points);
            }
        }

        if self.settings.show_markers {
            let radius = if viewport.zoom > 8.0 { 2 } else { 1 };
            for marker in markers {
                let (px, py) = viewport.project(marker.at);
                if !viewport.is_visible(px, py) {
                    continue;
                }
                let canvas = layers.layer_mut(marker.owner);
                match marker.kind {
                    MarkerKind::Region => draw_diamond(canvas, px, py, radius),
                    MarkerKind::Airfield => draw_cross(canvas, px, py, radius + 1),
                }

                if self.settings.show_labels && viewport.zoom >= Self::LABEL_ZOOM {
                    let char_x = (px / 2) as u16;
                    let char_y = (py / 4) as u16;
                    if let Some(label_x) = char_x.checked_add(2) {
                        layers.labels.push(Label {
                            x: label_x,
                            y: char_y,
                            text: marker.id.clone(),
                            owner: marker.owner,
                        });
                    }
                }
            }
        }

        layers
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_markers(&mut self) {
        self.settings.show_markers = !self.settings.show_markers;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Border;
    use crate::map::transform::DisplayCoord;

    fn dots(canvas: &BrailleCanvas) -> usize {
        (0..canvas.height())
            .flat_map(|row| (0..canvas.width()).map(move |col| (col, row)))
            .filter(|&(col, row)| canvas.cell(col, row).is_some())
            .count()
    }

    fn square(lat: f64, lon: f64, size: f64) -> Vec<DisplayCoord> {
        vec![
            DisplayCoord { lat, lon },
            DisplayCoord { lat, lon: lon + size },
            DisplayCoord { lat: lat + size, lon: lon + size },
            DisplayCoord { lat: lat + size, lon },
            DisplayCoord { lat, lon },
        ]
    }

    fn view() -> DayView {
        DayView {
            borders: vec![
                Border {
                    region_id: "R1".to_string(),
                    owner: Some(Coalition::Allies),
                    ring: square(0.0, 0.0, 10.0),
                },
                Border {
                    region_id: "R2".to_string(),
                    owner: None,
                    ring: square(-20.0, -20.0, 5.0),
                },
            ],
            ..DayView::default()
        }
    }

    #[test]
    fn test_borders_go_to_owner_layer() {
        let viewport = Viewport::new(DisplayCoord::default(), 60.0, 80, 80);
        let layers = OverlayRenderer::new().render(40, 20, &viewport, &view(), &[]);
        assert!(dots(&layers.allies) > 0);
        assert!(dots(&layers.neutral) > 0);
        assert_eq!(dots(&layers.axis), 0);
    }

    #[test]
    fn test_markers_and_labels() {
        let mut viewport = Viewport::new(DisplayCoord::default(), 60.0, 80, 80);
        let markers = vec![
            Marker {
                kind: MarkerKind::Airfield,
                id: "A1".to_string(),
                at: DisplayCoord { lat: 1.0, lon: 1.0 },
                owner: Some(Coalition::Axis),
            },
            Marker {
                kind: MarkerKind::Region,
                id: "Far".to_string(),
                at: DisplayCoord { lat: 80.0, lon: 80.0 },
                owner: None,
            },
        ];
        let renderer = OverlayRenderer::new();
        let layers = renderer.render(40, 20, &viewport, &DayView::default(), &markers);
        assert!(dots(&layers.axis) > 0);
        assert_eq!(dots(&layers.neutral), 0);
        // Labels only appear when zoomed in
        assert!(layers.labels.is_empty());

        viewport.zoom = 3.0;
        let layers = renderer.render(40, 20, &viewport, &DayView::default(), &markers);
        assert_eq!(layers.labels.len(), 1);
        assert_eq!(layers.labels[0].text, "A1");
    }

    #[test]
    fn test_zoomed_in_border_edge_is_drawn() {
        // One edge of the ring spans far beyond the view on both sides
        let view = DayView {
            borders: vec![Border {
                region_id: "R1".to_string(),
                owner: Some(Coalition::Allies),
                ring: vec![
                    DisplayCoord { lat: 0.0, lon: -50.0 },
                    DisplayCoord { lat: 0.0, lon: 50.0 },
                    DisplayCoord { lat: 40.0, lon: 50.0 },
                    DisplayCoord { lat: 0.0, lon: -50.0 },
                ],
            }],
            ..DayView::default()
        };
        let viewport = Viewport::new(DisplayCoord::default(), 20.0, 80, 80);
        let layers = OverlayRenderer::new().render(40, 20, &viewport, &view, &[]);
        let row = 40 / 4;
        let drawn = (0..40).filter(|&col| layers.allies.cell(col, row).is_some()).count();
        assert_eq!(drawn, 40);
    }

    #[test]
    fn test_toggles_hide_layers() {
        let viewport = Viewport::new(DisplayCoord::default(), 60.0, 80, 80);
        let mut renderer = OverlayRenderer::new();
        renderer.toggle_borders();
        let layers = renderer.render(40, 20, &viewport, &view(), &[]);
        assert_eq!(dots(&layers.allies), 0);
    }
}
