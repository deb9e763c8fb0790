use crate::model::{Vector2, World};
use glam::DVec2;

/// Geographic bounds of a map's tile set in the display system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl DisplayBounds {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    pub fn center(&self) -> DisplayCoord {
        DisplayCoord {
            lat: (self.south + self.north) * 0.5,
            lon: (self.west + self.east) * 0.5,
        }
    }
}

/// Position on the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayCoord {
    pub lat: f64,
    pub lon: f64,
}

/// Tile bounds per map, regardless of season.
const MAP_BOUNDS: &[(&str, DisplayBounds)] = &[(
    "rheinland",
    DisplayBounds::new(-90.0, -180.0, 68.27, 15.74),
)];

/// Display bounds for a map name such as `rheinland-summer`. Exact names win,
/// otherwise the part before the first `-` is tried.
pub fn map_bounds(map: &str) -> Option<DisplayBounds> {
    let lookup = |name: &str| {
        MAP_BOUNDS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, bounds)| *bounds)
    };
    lookup(map).or_else(|| map.split('-').next().and_then(lookup))
}

/// Game-world to display coordinates: independent linear interpolation per
/// axis, world X onto latitude and world Y onto longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldTransform {
    Linear {
        world_origin: DVec2,
        world_extent: DVec2,
        display_origin: DVec2,
        display_extent: DVec2,
    },
    /// Raw X as latitude, raw Y as longitude.
    Identity,
}

impl WorldTransform {
    pub fn new(south_west: Vector2, north_east: Vector2, bounds: DisplayBounds) -> Self {
        let world_origin = south_west.to_dvec2();
        WorldTransform::Linear {
            world_origin,
            world_extent: north_east.to_dvec2() - world_origin,
            display_origin: DVec2::new(bounds.south, bounds.west),
            display_extent: DVec2::new(bounds.north - bounds.south, bounds.east - bounds.west),
        }
    }

    /// Transform for a world's map. Unknown maps fall back to identity.
    pub fn for_world(world: &World) -> Self {
        match map_bounds(&world.map) {
            Some(bounds) => Self::new(world.map_south_west, world.map_north_east, bounds),
            None => {
                tracing::warn!(
                    map = %world.map,
                    "Bounds for map are unknown, using identity transform"
                );
                WorldTransform::Identity
            }
        }
    }

    pub fn apply(&self, p: Vector2) -> DisplayCoord {
        match self {
            WorldTransform::Linear {
                world_origin,
                world_extent,
                display_origin,
                display_extent,
            } => {
                let d = *display_origin
                    + *display_extent * (p.to_dvec2() - *world_origin) / *world_extent;
                DisplayCoord { lat: d.x, lon: d.y }
            }
            WorldTransform::Identity => DisplayCoord { lat: p.x, lon: p.y },
        }
    }

    /// Transform a polygon boundary, closing the ring.
    pub fn apply_ring(&self, boundary: &[Vector2]) -> Vec<DisplayCoord> {
        let mut ring: Vec<DisplayCoord> = boundary.iter().map(|&p| self.apply(p)).collect();
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        ring
    }

    /// Area of the display covered by the world, `None` for identity.
    pub fn display_bounds(&self) -> Option<DisplayBounds> {
        match self {
            WorldTransform::Linear {
                display_origin,
                display_extent,
                ..
            } => {
                let far = *display_origin + *display_extent;
                Some(DisplayBounds::new(display_origin.x, display_origin.y, far.x, far.y))
            }
            WorldTransform::Identity => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn rheinland() -> WorldTransform {
        WorldTransform::new(
            Vector2::new(0.0, 0.0),
            Vector2::new(350_000.0, 450_000.0),
            map_bounds("rheinland-summer").unwrap(),
        )
    }

    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    #[test]
    fn test_corners_map_to_bounds() {
        let tf = rheinland();
        let sw = tf.apply(Vector2::new(0.0, 0.0));
        assert!((sw.lat - -90.0).abs() < EPS);
        assert!((sw.lon - -180.0).abs() < EPS);
        let ne = tf.apply(Vector2::new(350_000.0, 450_000.0));
        assert!((ne.lat - 68.27).abs() < EPS);
        assert!((ne.lon - 15.74).abs() < EPS);
    }

    #[test]
    fn test_affine_per_axis() {
        let tf = rheinland();
        let p1 = Vector2::new(12_345.0, 400_000.0);
        let p2 = Vector2::new(300_000.0, -5_000.0);
        let (d1, d2) = (tf.apply(p1), tf.apply(p2));
        for t in [0.0, 0.25, 0.5, 0.9, 1.5] {
            let mid = tf.apply(Vector2::new(lerp(p1.x, p2.x, t), lerp(p1.y, p2.y, t)));
            assert!((mid.lat - lerp(d1.lat, d2.lat, t)).abs() < 1e-6);
            assert!((mid.lon - lerp(d1.lon, d2.lon, t)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unknown_map_is_identity() {
        let mut world = crate::aggregate::fixtures::world();
        world.map = "rheinland-winter".to_string();
        assert!(matches!(WorldTransform::for_world(&world), WorldTransform::Linear { .. }));

        world.map = "kuban-spring".to_string();
        let tf = WorldTransform::for_world(&world);
        assert_eq!(tf, WorldTransform::Identity);
        let d = tf.apply(Vector2::new(12.0, -7.5));
        assert_eq!(d, DisplayCoord { lat: 12.0, lon: -7.5 });
        assert!(tf.display_bounds().is_none());
    }

    #[test]
    fn test_ring_is_closed() {
        let tf = rheinland();
        let ring = tf.apply_ring(&[
            Vector2::new(0.0, 0.0),
            Vector2::new(1000.0, 0.0),
            Vector2::new(1000.0, 1000.0),
        ]);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);
        assert!(tf.apply_ring(&[]).is_empty());
    }

    #[test]
    fn test_display_bounds_round_trip() {
        let bounds = rheinland().display_bounds().unwrap();
        assert!((bounds.north - 68.27).abs() < EPS);
        assert!((bounds.east - 15.74).abs() < EPS);
    }
}
