// buildings.rs
//
// Optional building-footprint overlay, one file per dzongkhag.

use std::path::{Path, PathBuf};

use geo::MultiPolygon;
use plotters::prelude::RGBColor;
use tracing::debug;

use crate::color::hex;
use crate::features::{features_from_geojson, read_geojson};
use crate::state::DisplayMode;

/// Dzongkhags whose footprint file is named differently.
const FILE_NAME_REMAP: &[(&str, &str)] = &[("Trashyangtse", "Yangtse")];

pub fn building_file_base(region: &str) -> &str {
    FILE_NAME_REMAP
        .iter()
        .find(|(from, _)| *from == region)
        .map(|(_, to)| *to)
        .unwrap_or(region)
}

pub fn building_path(dir: &Path, region: &str) -> PathBuf {
    dir.join(format!("dzongkhag_{}.geojson", building_file_base(region)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingStyle {
    pub fill: RGBColor,
    pub stroke: RGBColor,
    pub stroke_width: u32,
    pub fill_opacity: f64,
}

impl BuildingStyle {
    pub fn for_mode(mode: DisplayMode) -> Self {
        match mode {
            DisplayMode::Standard => BuildingStyle {
                fill: hex(0x3b82f6),
                stroke: hex(0x1d4ed8),
                stroke_width: 1,
                fill_opacity: 1.0,
            },
            DisplayMode::OutlineOnly => BuildingStyle {
                fill: hex(0x2563eb),
                stroke: hex(0x1d4ed8),
                stroke_width: 2,
                fill_opacity: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildingLayer {
    pub region: String,
    pub footprints: Vec<MultiPolygon<f64>>,
    pub style: BuildingStyle,
}

/// Loads the footprints for `region`.
///
/// A missing, unreadable or empty file means "no buildings here" and yields
/// `None`; it is never reported as an error.
pub fn load_buildings(dir: &Path, region: &str, mode: DisplayMode) -> Option<BuildingLayer> {
    let path = building_path(dir, region);
    let geojson = match read_geojson(&path) {
        Ok(geojson) => geojson,
        Err(err) => {
            debug!(region, error = %err, "no building overlay");
            return None;
        }
    };

    let footprints: Vec<MultiPolygon<f64>> = features_from_geojson(geojson)
        .into_iter()
        .filter_map(|f| f.geometry)
        .collect();
    if footprints.is_empty() {
        debug!(region, path = %path.display(), "building file has no footprints");
        return None;
    }

    debug!(region, count = footprints.len(), "loaded building overlay");
    Some(BuildingLayer {
        region: region.to_string(),
        footprints,
        style: BuildingStyle::for_mode(mode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaps_known_file_names() {
        let dir = Path::new("data/buildings");
        assert_eq!(
            building_path(dir, "Trashyangtse"),
            dir.join("dzongkhag_Yangtse.geojson")
        );
        assert_eq!(
            building_path(dir, "Paro"),
            dir.join("dzongkhag_Paro.geojson")
        );
    }

    #[test]
    fn missing_file_is_no_overlay() {
        let dir = std::env::temp_dir().join("gewog-hazard-mapper-no-such-dir");
        assert!(load_buildings(&dir, "Paro", DisplayMode::Standard).is_none());
    }

    #[test]
    fn outline_mode_uses_heavier_stroke() {
        assert_eq!(BuildingStyle::for_mode(DisplayMode::OutlineOnly).stroke_width, 2);
        assert_eq!(BuildingStyle::for_mode(DisplayMode::Standard).stroke_width, 1);
    }
}
