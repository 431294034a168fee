// schema.rs

/// Property holding the dzongkhag (district) a gewog belongs to.
pub const REGION_KEY: &str = "_Dzongkhag";
/// Property holding the gewog display name.
pub const NAME_KEY: &str = "LAA";

/// Placeholder shown wherever a value is missing.
pub const MISSING: &str = "—";

/// How an attribute value is printed in the legend and popups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// More decimals for small magnitudes: 4 below 0.01, 3 below 1, else 2.
    AdaptivePrecision,
}

impl ValueFormat {
    pub fn format(self, value: Option<f64>) -> String {
        match (self, value) {
            (_, None) => MISSING.to_string(),
            (_, Some(v)) if v.is_nan() => MISSING.to_string(),
            (ValueFormat::AdaptivePrecision, Some(v)) => {
                if v < 0.01 {
                    format!("{:.4}", v)
                } else if v < 1.0 {
                    format!("{:.3}", v)
                } else {
                    format!("{:.2}", v)
                }
            }
        }
    }
}

/// One selectable hazard attribute.
#[derive(Debug, PartialEq, Eq)]
pub struct AttributeSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub format: ValueFormat,
}

impl AttributeSpec {
    pub fn format_value(&self, value: Option<f64>) -> String {
        self.format.format(value)
    }
}

pub static ATTRIBUTES: [AttributeSpec; 4] = [
    AttributeSpec {
        key: "_PGA M",
        label: "PGA(g) 2009",
        format: ValueFormat::AdaptivePrecision,
    },
    AttributeSpec {
        key: "_E Loss M (in BTN million)",
        label: "Economic Loss (BTN In million) 2009",
        format: ValueFormat::AdaptivePrecision,
    },
    AttributeSpec {
        key: "_PGA S",
        label: "PGA(g) 2011",
        format: ValueFormat::AdaptivePrecision,
    },
    AttributeSpec {
        key: "_E Loss S (in BTN million)",
        label: "Economic Loss (BTN In million) 2011",
        format: ValueFormat::AdaptivePrecision,
    },
];

/// The attribute selected before the user picks one.
pub fn default_attribute() -> &'static AttributeSpec {
    &ATTRIBUTES[0]
}

pub fn attribute_by_key(key: &str) -> Option<&'static AttributeSpec> {
    ATTRIBUTES.iter().find(|a| a.key == key)
}

/// Label for a key, falling back to the key itself for unknown attributes.
pub fn attribute_label(key: &str) -> &str {
    attribute_by_key(key).map(|a| a.label).unwrap_or(key)
}

/// The attribute after `current` in table order, wrapping around.
pub fn next_attribute(current: &AttributeSpec) -> &'static AttributeSpec {
    let pos = ATTRIBUTES
        .iter()
        .position(|a| a.key == current.key)
        .unwrap_or(0);
    &ATTRIBUTES[(pos + 1) % ATTRIBUTES.len()]
}

pub fn format_value(value: Option<f64>) -> String {
    ValueFormat::AdaptivePrecision.format(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_picks_precision_by_magnitude() {
        assert_eq!(format_value(Some(0.005)), "0.0050");
        assert_eq!(format_value(Some(0.25)), "0.250");
        assert_eq!(format_value(Some(12.0)), "12.00");
        assert_eq!(format_value(None), MISSING);
        assert_eq!(format_value(Some(f64::NAN)), MISSING);
    }

    #[test]
    fn lookup_and_cycle() {
        assert_eq!(attribute_label("_PGA S"), "PGA(g) 2011");
        assert_eq!(attribute_label("nope"), "nope");
        assert_eq!(default_attribute().key, "_PGA M");

        let mut attr = default_attribute();
        for _ in 0..ATTRIBUTES.len() {
            attr = next_attribute(attr);
        }
        assert_eq!(attr, default_attribute());
    }
}
