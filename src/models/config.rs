//! Arrow configuration and partial updates
//!
//! `ArrowConfig::apply` is the single entry point for configuration changes.
//! It validates the merged result before committing anything and reports
//! which fields actually changed, so the controller can tell a re-bind
//! (new source/target reference) from a plain recompute.

use super::options::{ArrowOptions, ArrowType};
use crate::error::OptionsError;
use crate::tracker::Side;
use serde::{Deserialize, Serialize};

/// Full configuration of one arrow
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrowConfig {
    #[serde(rename = "type")]
    pub mode: ArrowType,

    /// Reference to the source region; empty means unbound
    pub source: String,

    /// Reference to the target region; empty means unbound
    pub target: String,

    #[serde(flatten)]
    pub options: ArrowOptions,
}

/// Partial configuration; `None` leaves the current value alone
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrowConfigPatch {
    #[serde(rename = "type")]
    pub mode: Option<ArrowType>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub bow: Option<f64>,
    pub stretch: Option<f64>,
    pub stretch_min: Option<f64>,
    pub stretch_max: Option<f64>,
    pub pad_start: Option<f64>,
    pub pad_end: Option<f64>,
    pub flip: Option<bool>,
    pub straights: Option<bool>,
}

/// Configurable field names, as the host sees them
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ArrowField {
    #[serde(rename = "type")]
    Mode,
    Source,
    Target,
    Bow,
    Stretch,
    StretchMin,
    StretchMax,
    PadStart,
    PadEnd,
    Flip,
    Straights,
}

impl ArrowField {
    /// Element attribute name for this field
    pub fn attribute(&self) -> &'static str {
        match self {
            ArrowField::Mode => "type",
            ArrowField::Source => "source",
            ArrowField::Target => "target",
            ArrowField::Bow => "bow",
            ArrowField::Stretch => "stretch",
            ArrowField::StretchMin => "stretch-min",
            ArrowField::StretchMax => "stretch-max",
            ArrowField::PadStart => "pad-start",
            ArrowField::PadEnd => "pad-end",
            ArrowField::Flip => "flip",
            ArrowField::Straights => "straights",
        }
    }

    pub fn from_attribute(name: &str) -> Option<Self> {
        let field = match name {
            "type" => ArrowField::Mode,
            "source" => ArrowField::Source,
            "target" => ArrowField::Target,
            "bow" => ArrowField::Bow,
            "stretch" => ArrowField::Stretch,
            "stretch-min" => ArrowField::StretchMin,
            "stretch-max" => ArrowField::StretchMax,
            "pad-start" => ArrowField::PadStart,
            "pad-end" => ArrowField::PadEnd,
            "flip" => ArrowField::Flip,
            "straights" => ArrowField::Straights,
            _ => return None,
        };
        Some(field)
    }
}

/// Fields whose value changed in one `apply` call
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChangeSet(Vec<ArrowField>);

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: ArrowField) -> bool {
        self.0.contains(&field)
    }

    pub fn fields(&self) -> &[ArrowField] {
        &self.0
    }

    /// The reference for `side` changed and its tracker must be re-bound
    pub fn rebinds(&self, side: Side) -> bool {
        match side {
            Side::Source => self.contains(ArrowField::Source),
            Side::Target => self.contains(ArrowField::Target),
        }
    }

    /// A solver input other than the references changed
    pub fn affects_geometry(&self) -> bool {
        self.0
            .iter()
            .any(|field| !matches!(field, ArrowField::Source | ArrowField::Target))
    }

    fn record<T: PartialEq>(&mut self, field: ArrowField, slot: &mut T, value: Option<T>) {
        if let Some(value) = value {
            if *slot != value {
                *slot = value;
                self.0.push(field);
            }
        }
    }
}

impl ArrowConfig {
    pub fn reference(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Merge `patch` into this config
    ///
    /// Nothing is committed when the merged options fail validation.
    pub fn apply(&mut self, patch: ArrowConfigPatch) -> Result<ChangeSet, OptionsError> {
        let mut next = self.clone();
        let mut changes = ChangeSet::default();

        changes.record(ArrowField::Mode, &mut next.mode, patch.mode);
        changes.record(ArrowField::Source, &mut next.source, patch.source);
        changes.record(ArrowField::Target, &mut next.target, patch.target);

        let options = &mut next.options;
        changes.record(ArrowField::Bow, &mut options.bow, patch.bow);
        changes.record(ArrowField::Stretch, &mut options.stretch, patch.stretch);
        changes.record(ArrowField::StretchMin, &mut options.stretch_min, patch.stretch_min);
        changes.record(ArrowField::StretchMax, &mut options.stretch_max, patch.stretch_max);
        changes.record(ArrowField::PadStart, &mut options.pad_start, patch.pad_start);
        changes.record(ArrowField::PadEnd, &mut options.pad_end, patch.pad_end);
        changes.record(ArrowField::Flip, &mut options.flip, patch.flip);
        changes.record(ArrowField::Straights, &mut options.straights, patch.straights);

        next.options.validate()?;
        *self = next;
        Ok(changes)
    }
}

impl ArrowConfigPatch {
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(json).map_err(|e| OptionsError::Malformed(e.to_string()))
    }

    /// Build a patch from an element attribute change
    ///
    /// `value` is `None` when the attribute was removed: booleans become
    /// `false`, everything else returns to its default.
    pub fn from_attribute(name: &str, value: Option<&str>) -> Result<Self, OptionsError> {
        let field = ArrowField::from_attribute(name)
            .ok_or_else(|| OptionsError::UnknownAttribute(name.to_string()))?;
        let defaults = ArrowConfig::default();
        let mut patch = ArrowConfigPatch::default();

        let number = |default: f64| -> Result<f64, OptionsError> {
            match value {
                None => Ok(default),
                Some(raw) => raw.trim().parse::<f64>().map_err(|_| OptionsError::InvalidNumber {
                    name: name.to_string(),
                    value: raw.to_string(),
                }),
            }
        };

        match field {
            ArrowField::Mode => {
                patch.mode = Some(match value {
                    Some(raw) => raw.parse()?,
                    None => defaults.mode,
                });
            }
            ArrowField::Source => patch.source = Some(value.unwrap_or_default().to_string()),
            ArrowField::Target => patch.target = Some(value.unwrap_or_default().to_string()),
            ArrowField::Bow => patch.bow = Some(number(defaults.options.bow)?),
            ArrowField::Stretch => patch.stretch = Some(number(defaults.options.stretch)?),
            ArrowField::StretchMin => patch.stretch_min = Some(number(defaults.options.stretch_min)?),
            ArrowField::StretchMax => patch.stretch_max = Some(number(defaults.options.stretch_max)?),
            ArrowField::PadStart => patch.pad_start = Some(number(defaults.options.pad_start)?),
            ArrowField::PadEnd => patch.pad_end = Some(number(defaults.options.pad_end)?),
            ArrowField::Flip => patch.flip = Some(value.is_some()),
            ArrowField::Straights => patch.straights = Some(value.is_some()),
        }

        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_reports_only_changed_fields() {
        let mut config = ArrowConfig::default();
        let changes = config
            .apply(ArrowConfigPatch {
                bow: Some(0.2),
                pad_end: Some(20.0), // already the default
                ..Default::default()
            })
            .unwrap();

        assert_eq!(changes.fields(), &[ArrowField::Bow]);
        assert!(changes.affects_geometry());
        assert!(!changes.rebinds(Side::Source));
        assert_eq!(config.options.bow, 0.2);
    }

    #[test]
    fn test_apply_reference_change_rebinds_without_geometry() {
        let mut config = ArrowConfig::default();
        let changes = config
            .apply(ArrowConfigPatch {
                target: Some("#b".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(changes.rebinds(Side::Target));
        assert!(!changes.rebinds(Side::Source));
        assert!(!changes.affects_geometry());
    }

    #[test]
    fn test_invalid_patch_leaves_config_untouched() {
        let mut config = ArrowConfig::default();
        let result = config.apply(ArrowConfigPatch {
            bow: Some(0.5),
            stretch_min: Some(1000.0),
            ..Default::default()
        });

        assert!(matches!(result, Err(OptionsError::InvertedStretch { .. })));
        assert_eq!(config, ArrowConfig::default());
    }

    #[test]
    fn test_patch_from_camel_case_json() {
        let patch = ArrowConfigPatch::from_json(
            r##"{"type":"point","source":"#a","stretchMin":10,"padEnd":4,"flip":true}"##,
        )
        .unwrap();

        assert_eq!(patch.mode, Some(ArrowType::Point));
        assert_eq!(patch.source.as_deref(), Some("#a"));
        assert_eq!(patch.stretch_min, Some(10.0));
        assert_eq!(patch.pad_end, Some(4.0));
        assert_eq!(patch.flip, Some(true));
        assert_eq!(patch.bow, None);
    }

    #[test]
    fn test_attribute_names_are_kebab_case() {
        let patch = ArrowConfigPatch::from_attribute("stretch-max", Some("300")).unwrap();
        assert_eq!(patch.stretch_max, Some(300.0));

        let patch = ArrowConfigPatch::from_attribute("pad-start", Some(" 8 ")).unwrap();
        assert_eq!(patch.pad_start, Some(8.0));
    }

    #[test]
    fn test_removed_attributes_restore_defaults() {
        let patch = ArrowConfigPatch::from_attribute("pad-end", None).unwrap();
        assert_eq!(patch.pad_end, Some(20.0));

        let patch = ArrowConfigPatch::from_attribute("type", None).unwrap();
        assert_eq!(patch.mode, Some(ArrowType::Box));
    }

    #[test]
    fn test_boolean_attributes_use_presence() {
        let patch = ArrowConfigPatch::from_attribute("flip", Some("")).unwrap();
        assert_eq!(patch.flip, Some(true));

        let patch = ArrowConfigPatch::from_attribute("straights", None).unwrap();
        assert_eq!(patch.straights, Some(false));
    }

    #[test]
    fn test_bad_attribute_values() {
        assert_eq!(
            ArrowConfigPatch::from_attribute("bend", Some("1")),
            Err(OptionsError::UnknownAttribute("bend".to_string()))
        );
        assert!(matches!(
            ArrowConfigPatch::from_attribute("bow", Some("lots")),
            Err(OptionsError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_field_attribute_names_round_trip() {
        for name in ["type", "source", "stretch-min", "pad-end", "straights"] {
            let field = ArrowField::from_attribute(name).unwrap();
            assert_eq!(field.attribute(), name);
        }
    }
}
