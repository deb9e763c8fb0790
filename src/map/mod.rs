pub mod geometry;
pub mod projection;
pub mod renderer;
pub mod spatial;
pub mod transform;

pub use projection::Viewport;
pub use renderer::{DisplaySettings, Label, OverlayLayers, OverlayRenderer};
pub use spatial::SpatialGrid;
pub use transform::{DisplayBounds, DisplayCoord, WorldTransform};
