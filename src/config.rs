// config.rs

use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "data/gewogs.geojson";
pub const DEFAULT_BUILDINGS_DIR: &str = "data/buildings/";
pub const OUTPUT_DIR: &str = "output/";
pub const LOG_FILE_NAME: &str = "gewog-hazard-mapper.log";

/// Runtime settings, filled from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_path: PathBuf,
    pub buildings_dir: PathBuf,
    pub output_dir: PathBuf,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            buildings_dir: PathBuf::from(DEFAULT_BUILDINGS_DIR),
            output_dir: PathBuf::from(OUTPUT_DIR),
            image_width: 1600,
            image_height: 1200,
        }
    }
}

impl Settings {
    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(LOG_FILE_NAME)
    }
}
