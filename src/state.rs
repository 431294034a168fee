// state.rs

use crate::schema::{self, AttributeSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Gewogs shaded by the selected attribute.
    #[default]
    Standard,
    /// Neutral gewog outlines, buildings emphasised.
    OutlineOnly,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Standard => DisplayMode::OutlineOnly,
            DisplayMode::OutlineOnly => DisplayMode::Standard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Standard => "Standard",
            DisplayMode::OutlineOnly => "Outline only",
        }
    }
}

/// What the user has selected. Changed only through [`ViewState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub region: Option<String>,
    pub attribute: &'static AttributeSpec,
    pub mode: DisplayMode,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            region: None,
            attribute: schema::default_attribute(),
            mode: DisplayMode::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    SelectRegion(Option<String>),
    /// Unknown keys select the default attribute.
    SelectAttribute(String),
    NextAttribute,
    SetDisplayMode(DisplayMode),
    ToggleDisplayMode,
}

impl ViewState {
    pub fn apply(self, action: ViewAction) -> ViewState {
        match action {
            ViewAction::SelectRegion(region) => ViewState {
                region: region.filter(|r| !r.is_empty()),
                ..self
            },
            ViewAction::SelectAttribute(key) => ViewState {
                attribute: schema::attribute_by_key(&key)
                    .unwrap_or_else(schema::default_attribute),
                ..self
            },
            ViewAction::NextAttribute => ViewState {
                attribute: schema::next_attribute(self.attribute),
                ..self
            },
            ViewAction::SetDisplayMode(mode) => ViewState { mode, ..self },
            ViewAction::ToggleDisplayMode => ViewState {
                mode: self.mode.toggled(),
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_pure() {
        let start = ViewState::default();
        let next = start
            .clone()
            .apply(ViewAction::SelectRegion(Some("Paro".into())))
            .apply(ViewAction::SelectAttribute("_PGA S".into()))
            .apply(ViewAction::ToggleDisplayMode);

        assert_eq!(start, ViewState::default());
        assert_eq!(next.region.as_deref(), Some("Paro"));
        assert_eq!(next.attribute.key, "_PGA S");
        assert_eq!(next.mode, DisplayMode::OutlineOnly);
    }

    #[test]
    fn unknown_attribute_and_empty_region_fall_back() {
        let state = ViewState::default()
            .apply(ViewAction::NextAttribute)
            .apply(ViewAction::SelectAttribute("bogus".into()))
            .apply(ViewAction::SelectRegion(Some(String::new())));
        assert_eq!(state.attribute, schema::default_attribute());
        assert_eq!(state.region, None);
    }
}
