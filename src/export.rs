//! GeoJSON export of one campaign day.

use crate::aggregate::{self, BuildingMatch};
use crate::map::transform::{DisplayCoord, WorldTransform};
use crate::model::{owner_label, WarState, World};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

fn position(coord: DisplayCoord) -> Vec<f64> {
    vec![coord.lon, coord.lat]
}

/// Regions as polygons and airfields as points, in display coordinates.
pub fn feature_collection(
    world: &World,
    transform: &WorldTransform,
    state: &WarState,
    matching: BuildingMatch,
) -> FeatureCollection {
    let mut features = Vec::with_capacity(world.regions.len() + world.airfields.len());

    for region in &world.regions {
        let ring: Vec<Vec<f64>> = transform
            .apply_ring(&region.boundary)
            .into_iter()
            .map(position)
            .collect();
        let mut feature = Feature::from(Geometry::new(Value::Polygon(vec![ring])));
        feature.set_property("id", region.id.as_str());
        feature.set_property("kind", "region");
        feature.set_property("owner", owner_label(aggregate::owner_of(state, &region.id)));
        feature.set_property("supplies", aggregate::supplies_of(state, &region.id));
        feature.set_property(
            "storage",
            aggregate::capacity_in_region(world, region, state, matching),
        );
        features.push(feature);
    }

    for airfield in &world.airfields {
        let at = transform.apply(airfield.position);
        let mut feature = Feature::from(Geometry::new(Value::Point(position(at))));
        feature.set_property("id", airfield.id.as_str());
        feature.set_property("kind", "airfield");
        feature.set_property("owner", owner_label(aggregate::owner_of(state, &airfield.region)));
        feature.set_property("planes", aggregate::planes_at(state, &airfield.id));
        feature.set_property(
            "storage",
            aggregate::capacity_at_airfield(world, airfield, state, matching),
        );
        features.push(feature);
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson(path: &Path, collection: FeatureCollection) -> Result<()> {
    let count = collection.features.len();
    let text = GeoJson::FeatureCollection(collection).to_string();
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), features = count, "GeoJSON written");
    Ok(())
}
