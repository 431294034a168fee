// render.rs
//
// Turns the current view state into map layers and a legend.

use geo::{BoundingRect, Coord, Rect};
use plotters::prelude::RGBColor;
use tracing::{debug, info};

use crate::buildings::BuildingLayer;
use crate::classify::{Classification, class_count_for, compute_breaks};
use crate::color::{class_color, hex, to_hex};
use crate::features::Feature;
use crate::label::{LabelStrategy, label_point};
use crate::legend::Legend;
use crate::region_index::RegionIndex;
use crate::schema::{ATTRIBUTES, MISSING};
use crate::state::{DisplayMode, ViewState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    pub fill: RGBColor,
    pub fill_opacity: f64,
    pub stroke: RGBColor,
    pub stroke_width: f64,
}

const WHITE: RGBColor = RGBColor(255, 255, 255);

/// Every gewog in outline-only mode.
pub const NEUTRAL_STYLE: FeatureStyle = FeatureStyle {
    fill: hex(0xfef9c3),
    fill_opacity: 0.6,
    stroke: WHITE,
    stroke_width: 1.5,
};

/// Gewogs without a numeric value for the selected attribute.
pub const NO_DATA_STYLE: FeatureStyle = FeatureStyle {
    fill: hex(0x94a3b8),
    fill_opacity: 0.5,
    stroke: WHITE,
    stroke_width: 1.5,
};

pub fn classified_style(fill: RGBColor) -> FeatureStyle {
    FeatureStyle {
        fill,
        fill_opacity: 0.55,
        stroke: WHITE,
        stroke_width: 1.5,
    }
}

#[derive(Debug, Clone)]
pub struct StyledFeature {
    pub feature: Feature,
    pub value: Option<f64>,
    pub class_index: Option<usize>,
    pub style: FeatureStyle,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub position: Coord<f64>,
    pub strategy: LabelStrategy,
}

/// Map extent in lon/lat, already padded around the rendered gewogs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Viewport {
    const PADDING: f64 = 0.1;
    const MIN_SPAN: f64 = 0.001;

    pub fn fit(bounds: Rect<f64>) -> Self {
        let (min, max) = (bounds.min(), bounds.max());
        let lon_span = (max.x - min.x).max(Self::MIN_SPAN);
        let lat_span = (max.y - min.y).max(Self::MIN_SPAN);
        let lon_padding = lon_span * Self::PADDING;
        let lat_padding = lat_span * Self::PADDING;

        Viewport {
            min_x: (min.x - lon_padding).max(-180.0),
            max_x: (max.x + lon_padding).min(180.0),
            min_y: (min.y - lat_padding).max(-90.0),
            max_y: (max.y + lat_padding).min(90.0),
        }
    }

    pub fn x_range(&self) -> std::ops::Range<f64> {
        self.min_x..self.max_x
    }

    pub fn y_range(&self) -> std::ops::Range<f64> {
        self.min_y..self.max_y
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Gewogs(Vec<StyledFeature>),
    Labels(Vec<Label>),
    Buildings(BuildingLayer),
}

/// Everything drawn for one selected dzongkhag.
#[derive(Debug, Clone)]
pub struct Scene {
    pub region: String,
    pub view: ViewState,
    pub classification: Option<Classification>,
    pub viewport: Option<Viewport>,
    pub layers: Vec<Layer>,
}

impl Scene {
    pub fn gewogs(&self) -> &[StyledFeature] {
        self.layers
            .iter()
            .find_map(|l| match l {
                Layer::Gewogs(features) => Some(features.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn labels(&self) -> &[Label] {
        self.layers
            .iter()
            .find_map(|l| match l {
                Layer::Labels(labels) => Some(labels.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn buildings(&self) -> Option<&BuildingLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Buildings(b) => Some(b),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub enum RenderState {
    /// No region selected, or the selected region has no gewogs.
    #[default]
    Idle,
    Rendering(Scene),
}

/// Ask for the building overlay of the scene rendered as `generation`.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRequest {
    pub generation: u64,
    pub region: String,
    pub mode: DisplayMode,
}

/// Owns the map layers. Each render starts from an empty layer set.
#[derive(Debug)]
pub struct RenderCoordinator {
    state: RenderState,
    legend: Legend,
    generation: u64,
}

impl Default for RenderCoordinator {
    fn default() -> Self {
        RenderCoordinator {
            state: RenderState::Idle,
            legend: Legend::empty(&ViewState::default()),
            generation: 0,
        }
    }
}

impl RenderCoordinator {
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            RenderState::Rendering(scene) => Some(scene),
            RenderState::Idle => None,
        }
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn layers(&self) -> &[Layer] {
        self.scene().map(|s| s.layers.as_slice()).unwrap_or(&[])
    }

    /// Drops every layer and returns to `Idle`.
    pub fn clear(&mut self) {
        self.state = RenderState::Idle;
    }

    /// Full re-render of `view`.
    ///
    /// Returns the overlay request for the new scene, or `None` when the
    /// coordinator ends up `Idle`.
    pub fn render(&mut self, view: &ViewState, index: &RegionIndex) -> Option<OverlayRequest> {
        self.clear();
        self.generation += 1;

        let Some(region) = view.region.as_deref() else {
            self.legend = Legend::empty(view);
            return None;
        };
        let features = index.features_in(region);
        if features.is_empty() {
            debug!(region, "no gewogs in region");
            self.legend = Legend::empty(view);
            return None;
        }

        let classification = match view.mode {
            DisplayMode::OutlineOnly => None,
            DisplayMode::Standard => compute_breaks(
                features.iter().map(|f| f.attribute(view.attribute.key)),
                class_count_for(features.len()),
            ),
        };

        let styled: Vec<StyledFeature> = features
            .iter()
            .map(|f| style_feature(f, view, classification.as_ref()))
            .collect();
        let labels: Vec<Label> = features.iter().filter_map(place_label).collect();
        let viewport = features
            .iter()
            .filter_map(|f| f.geometry.as_ref()?.bounding_rect())
            .reduce(union)
            .map(Viewport::fit);

        self.legend = Legend::build(view, classification.as_ref());
        let top_fill = classification
            .as_ref()
            .map(|c| to_hex(class_color(c.class_count - 1, c.class_count)))
            .unwrap_or_else(|| MISSING.to_string());
        info!(
            region,
            attribute = view.attribute.key,
            mode = view.mode.label(),
            gewogs = styled.len(),
            classes = classification.as_ref().map(|c| c.class_count),
            top_fill = %top_fill,
            "rendered view"
        );

        let mut scene = Scene {
            region: region.to_string(),
            view: view.clone(),
            classification,
            viewport,
            layers: Vec::new(),
        };
        scene.layers.push(Layer::Gewogs(styled));
        scene.layers.push(Layer::Labels(labels));
        self.state = RenderState::Rendering(scene);

        Some(OverlayRequest {
            generation: self.generation,
            region: region.to_string(),
            mode: view.mode,
        })
    }

    /// Adds a loaded building overlay if it belongs to the current scene.
    ///
    /// Results from an older render are discarded. Returns whether the
    /// overlay was applied.
    pub fn apply_overlay(&mut self, generation: u64, overlay: Option<BuildingLayer>) -> bool {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "discarding stale building overlay"
            );
            return false;
        }
        let RenderState::Rendering(scene) = &mut self.state else {
            return false;
        };
        scene.layers.retain(|l| !matches!(l, Layer::Buildings(_)));
        match overlay {
            Some(layer) if layer.region == scene.region => {
                scene.layers.push(Layer::Buildings(layer));
                true
            }
            _ => false,
        }
    }
}

fn style_feature(
    feature: &Feature,
    view: &ViewState,
    classification: Option<&Classification>,
) -> StyledFeature {
    let value = feature.attribute(view.attribute.key);
    let (class_index, style) = match (view.mode, value, classification) {
        (DisplayMode::OutlineOnly, _, _) => (None, NEUTRAL_STYLE),
        (DisplayMode::Standard, Some(v), Some(c)) => {
            let i = c.class_index(v);
            (Some(i), classified_style(class_color(i, c.class_count)))
        }
        (DisplayMode::Standard, _, _) => (None, NO_DATA_STYLE),
    };
    StyledFeature {
        feature: feature.clone(),
        value,
        class_index,
        style,
    }
}

fn place_label(feature: &Feature) -> Option<Label> {
    let text = feature.name.as_deref().filter(|n| !n.is_empty())?;
    let (position, strategy) = label_point(feature.geometry.as_ref()?)?;
    Some(Label {
        text: text.to_string(),
        position,
        strategy,
    })
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Popup text for a gewog: name, dzongkhag and every attribute.
pub fn popup_lines(feature: &Feature) -> Vec<String> {
    let mut lines = vec![
        feature.name.clone().unwrap_or_else(|| MISSING.to_string()),
        format!(
            "Dzongkhag: {}",
            feature.region.as_deref().unwrap_or(MISSING)
        ),
    ];
    lines.extend(ATTRIBUTES.iter().map(|a| {
        format!("{}: {}", a.label, a.format_value(feature.attribute(a.key)))
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::BuildingStyle;
    use crate::state::ViewAction;
    use geo::{MultiPolygon, polygon};
    use serde_json::json;

    fn gewog(region: &str, name: &str, pga: Option<f64>, offset: f64) -> Feature {
        let mut props = serde_json::Map::new();
        props.insert("_Dzongkhag".into(), json!(region));
        props.insert("LAA".into(), json!(name));
        if let Some(v) = pga {
            props.insert("_PGA M".into(), json!(v));
        }
        let geometry = MultiPolygon(vec![polygon![
            (x: 90.0 + offset, y: 27.0),
            (x: 90.1 + offset, y: 27.0),
            (x: 90.1 + offset, y: 27.1),
            (x: 90.0 + offset, y: 27.1),
            (x: 90.0 + offset, y: 27.0),
        ]]);
        Feature::new(Some(geometry), props)
    }

    fn index_with(region: &str, n: usize) -> RegionIndex {
        RegionIndex::build(
            (0..n)
                .map(|i| gewog(region, &format!("G{i}"), Some(i as f64 * 0.1), i as f64 * 0.1))
                .collect(),
        )
    }

    fn select(region: &str) -> ViewState {
        ViewState::default().apply(ViewAction::SelectRegion(Some(region.into())))
    }

    #[test]
    fn class_count_follows_region_size() {
        let mut coordinator = RenderCoordinator::default();

        coordinator.render(&select("Haa"), &index_with("Haa", 7));
        let c = coordinator.scene().unwrap().classification.clone().unwrap();
        assert_eq!(c.class_count, 4);

        coordinator.render(&select("Haa"), &index_with("Haa", 8));
        let c = coordinator.scene().unwrap().classification.clone().unwrap();
        assert_eq!(c.class_count, 5);
        assert_eq!(coordinator.legend().items.len(), 5);
    }

    #[test]
    fn empty_region_renders_nothing() {
        let mut coordinator = RenderCoordinator::default();
        let request = coordinator.render(&select("Gasa"), &index_with("Haa", 3));
        assert!(request.is_none());
        assert!(matches!(coordinator.state(), RenderState::Idle));
        assert!(coordinator.layers().is_empty());
        assert!(!coordinator.legend().has_data);
    }

    #[test]
    fn outline_mode_styles_uniformly() {
        let index = index_with("Haa", 6);
        let view = select("Haa").apply(ViewAction::SetDisplayMode(DisplayMode::OutlineOnly));
        let mut coordinator = RenderCoordinator::default();
        coordinator.render(&view, &index);

        let scene = coordinator.scene().unwrap();
        assert!(scene.classification.is_none());
        assert!(scene.gewogs().iter().all(|g| g.style == NEUTRAL_STYLE));
        assert!(!coordinator.legend().visible);
    }

    #[test]
    fn missing_values_get_no_data_style() {
        let index = RegionIndex::build(vec![
            gewog("Haa", "A", Some(0.1), 0.0),
            gewog("Haa", "B", None, 0.2),
            gewog("Haa", "C", Some(0.5), 0.4),
        ]);
        let mut coordinator = RenderCoordinator::default();
        coordinator.render(&select("Haa"), &index);

        let gewogs = coordinator.scene().unwrap().gewogs();
        assert_eq!(gewogs[1].style, NO_DATA_STYLE);
        assert_eq!(gewogs[0].class_index, Some(0));
        assert_eq!(gewogs[2].class_index, Some(3));
    }

    #[test]
    fn all_missing_values_means_no_classification() {
        let index = RegionIndex::build(vec![gewog("Haa", "A", None, 0.0)]);
        let mut coordinator = RenderCoordinator::default();
        coordinator.render(&select("Haa"), &index);

        let scene = coordinator.scene().unwrap();
        assert!(scene.classification.is_none());
        assert_eq!(scene.gewogs()[0].style, NO_DATA_STYLE);
        assert!(!coordinator.legend().has_data);
    }

    #[test]
    fn layers_do_not_accumulate() {
        let index = index_with("Haa", 3);
        let mut coordinator = RenderCoordinator::default();
        for _ in 0..3 {
            coordinator.render(&select("Haa"), &index);
        }
        assert_eq!(coordinator.layers().len(), 2);
        assert_eq!(coordinator.scene().unwrap().labels().len(), 3);
        assert!(coordinator.scene().unwrap().viewport.is_some());
    }

    #[test]
    fn stale_overlay_is_discarded() {
        let index = index_with("Haa", 3);
        let mut coordinator = RenderCoordinator::default();
        let first = coordinator.render(&select("Haa"), &index).unwrap();
        let second = coordinator.render(&select("Haa"), &index).unwrap();

        let overlay = || BuildingLayer {
            region: "Haa".into(),
            footprints: Vec::new(),
            style: BuildingStyle::for_mode(DisplayMode::Standard),
        };
        assert!(!coordinator.apply_overlay(first.generation, Some(overlay())));
        assert!(coordinator.scene().unwrap().buildings().is_none());
        assert!(coordinator.apply_overlay(second.generation, Some(overlay())));
        assert!(coordinator.scene().unwrap().buildings().is_some());
    }

    #[test]
    fn viewport_pads_bounds() {
        let rect = Rect::new(Coord { x: 90.0, y: 27.0 }, Coord { x: 91.0, y: 28.0 });
        let v = Viewport::fit(rect);
        assert!((v.min_x - 89.9).abs() < 1e-9);
        assert!((v.max_y - 28.1).abs() < 1e-9);
    }

    #[test]
    fn popup_lists_every_attribute() {
        let lines = popup_lines(&gewog("Haa", "Bji", Some(0.25), 0.0));
        assert_eq!(lines[0], "Bji");
        assert_eq!(lines[1], "Dzongkhag: Haa");
        assert_eq!(lines[2], "PGA(g) 2009: 0.250");
        assert_eq!(lines[3], "Economic Loss (BTN In million) 2009: —");
        assert_eq!(lines.len(), 2 + ATTRIBUTES.len());
    }
}
