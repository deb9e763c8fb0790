use super::transform::DisplayCoord;
use std::collections::HashMap;

/// Spatial hash grid over display coordinates, used to find the marker under
/// the cursor without scanning every region and airfield.
pub struct SpatialGrid<T> {
    /// Grid cells indexed by (cell_x, cell_y)
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Items with their positions; cells store indices into this vec
    items: Vec<(DisplayCoord, T)>,
    /// Cell size in display degrees
    cell_size: f64,
}

impl<T> SpatialGrid<T> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size: cell_size.max(f64::EPSILON),
        }
    }

    #[inline(always)]
    fn to_cell(&self, at: DisplayCoord) -> (i32, i32) {
        let x = (at.lon / self.cell_size).floor() as i32;
        let y = (at.lat / self.cell_size).floor() as i32;
        (x, y)
    }

    pub fn insert(&mut self, at: DisplayCoord, item: T) {
        let idx = self.items.len();
        self.items.push((at, item));
        let cell = self.to_cell(at);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Indices of items in the cells around a point. May include items
    /// slightly outside the radius.
    pub fn query_radius(&self, at: DisplayCoord, radius: f64) -> Vec<usize> {
        let center = self.to_cell(at);
        let reach = (radius / self.cell_size).ceil() as i32;

        let mut results = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(indices) = self.cells.get(&(center.0 + dx, center.1 + dy)) {
                    results.extend_from_slice(indices);
                }
            }
        }
        results
    }

    /// Closest item within `radius` of a point
    pub fn nearest(&self, at: DisplayCoord, radius: f64) -> Option<&T> {
        self.query_radius(at, radius)
            .into_iter()
            .filter_map(|idx| self.items.get(idx))
            .map(|(pos, item)| {
                let (dlat, dlon) = (pos.lat - at.lat, pos.lon - at.lon);
                (dlat * dlat + dlon * dlon, item)
            })
            .filter(|(d2, _)| *d2 <= radius * radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }

    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx).map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> DisplayCoord {
        DisplayCoord { lat, lon }
    }

    #[test]
    fn test_nearest_picks_closest() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(at(0.0, 0.0), "origin");
        grid.insert(at(0.4, 0.4), "close");
        grid.insert(at(5.0, 5.0), "far");
        assert_eq!(grid.nearest(at(0.5, 0.5), 1.0), Some(&"close"));
        assert_eq!(grid.nearest(at(5.1, 4.9), 0.5), Some(&"far"));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_nearest_respects_radius() {
        let mut grid = SpatialGrid::new(2.0);
        grid.insert(at(-3.0, -3.0), 7u32);
        assert_eq!(grid.nearest(at(0.0, 0.0), 1.0), None);
        assert_eq!(grid.nearest(at(-2.5, -2.5), 1.0), Some(&7));
    }

    #[test]
    fn test_query_crosses_cells() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(at(0.9, 0.9), 'a');
        grid.insert(at(1.1, 1.1), 'b');
        let hits = grid.query_radius(at(1.0, 1.0), 0.5);
        assert_eq!(hits.len(), 2);
        assert!(grid.get(hits[0]).is_some());
    }
}
