// legend.rs

use plotters::prelude::RGBColor;

use crate::classify::Classification;
use crate::color::class_color;
use crate::schema::{AttributeSpec, MISSING};
use crate::state::{DisplayMode, ViewState};

/// Swatches shown while there is nothing to classify.
pub const NO_DATA_CLASS_COUNT: usize = 5;

pub const BUILDING_ROW_LABEL: &str = "Building footprint";

#[derive(Debug, Clone, PartialEq)]
pub struct LegendItem {
    pub color: RGBColor,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    /// Hidden in outline-only mode.
    pub visible: bool,
    pub title: String,
    pub caption: String,
    pub items: Vec<LegendItem>,
    pub has_data: bool,
    pub show_buildings: bool,
}

impl Legend {
    pub fn build(view: &ViewState, classification: Option<&Classification>) -> Self {
        let attribute = view.attribute;
        let title = format!("{} (equal interval)", attribute.label);
        let caption = caption(attribute);

        if view.mode == DisplayMode::OutlineOnly {
            return Legend {
                visible: false,
                title,
                caption,
                items: Vec::new(),
                has_data: false,
                show_buildings: false,
            };
        }

        let items = match classification {
            Some(c) => (0..c.class_count)
                .map(|i| LegendItem {
                    color: class_color(i, c.class_count),
                    label: match c.class_range(i) {
                        Some((lo, hi)) => format!(
                            "{} – {}",
                            attribute.format_value(Some(lo)),
                            attribute.format_value(Some(hi))
                        ),
                        None => MISSING.to_string(),
                    },
                })
                .collect(),
            None => (0..NO_DATA_CLASS_COUNT)
                .map(|i| LegendItem {
                    color: class_color(i, NO_DATA_CLASS_COUNT),
                    label: MISSING.to_string(),
                })
                .collect(),
        };

        Legend {
            visible: true,
            title,
            caption,
            items,
            has_data: classification.is_some(),
            show_buildings: classification.is_some(),
        }
    }

    /// Legend shown before any region is selected.
    pub fn empty(view: &ViewState) -> Self {
        Legend::build(view, None)
    }
}

pub fn caption(attribute: &AttributeSpec) -> String {
    format!("{}: green (low) → red (high)", attribute.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::compute_breaks;
    use crate::color::color_for;
    use crate::state::ViewAction;

    #[test]
    fn classified_legend_lists_ranges() {
        let view = ViewState::default();
        let c = compute_breaks([Some(0.0), Some(0.4)], 4).unwrap();
        let legend = Legend::build(&view, Some(&c));

        assert!(legend.visible && legend.has_data && legend.show_buildings);
        assert_eq!(legend.title, "PGA(g) 2009 (equal interval)");
        assert_eq!(legend.items.len(), 4);
        assert_eq!(legend.items[0].label, "0.0000 – 0.100");
        assert_eq!(legend.items[3].label, "0.300 – 0.400");
        assert_eq!(legend.items[0].color, color_for(Some(0.125)));
    }

    #[test]
    fn no_data_legend_has_placeholder_rows() {
        let legend = Legend::empty(&ViewState::default());
        assert!(legend.visible);
        assert!(!legend.has_data);
        assert!(!legend.show_buildings);
        assert_eq!(legend.items.len(), NO_DATA_CLASS_COUNT);
        assert!(legend.items.iter().all(|i| i.label == MISSING));
    }

    #[test]
    fn outline_mode_hides_legend() {
        let view = ViewState::default().apply(ViewAction::ToggleDisplayMode);
        let legend = Legend::empty(&view);
        assert!(!legend.visible);
        assert!(legend.items.is_empty());
    }
}
