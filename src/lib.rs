//! Choropleth maps of seismic-hazard attributes over the gewogs of Bhutan's
//! dzongkhags, with building-footprint overlays and PNG export.

pub mod buildings;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod label;
pub mod legend;
pub mod plot;
pub mod region_index;
pub mod render;
pub mod schema;
pub mod state;
