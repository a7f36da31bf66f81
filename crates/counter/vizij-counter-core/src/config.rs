//! Counter and engine configuration.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::CounterError;

/// Which contiguous digit run in the source text holds the target value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitRun {
    #[default]
    First,
    Last,
}

/// Where the host reads the target value from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// The element's own text content.
    #[default]
    Text,
    /// A named attribute on the element (e.g. `data-count`).
    Attribute { name: String },
}

/// Per-counter animation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub duration_ms: f64,
    pub easing: Easing,
    /// Fraction of the element that must be visible before the counter starts.
    pub threshold: f32,
    /// Margin around the viewport, CSS shorthand. Passed through to the visibility source.
    pub root_margin: String,
    pub digit_run: DigitRun,
    pub source: ValueSource,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::stat_card()
    }
}

impl CounterConfig {
    /// Stat cards: `"85%"`, `"50+"` in the element text, linear over 1.5s.
    pub fn stat_card() -> Self {
        Self {
            duration_ms: 1500.0,
            easing: Easing::Linear,
            threshold: 0.5,
            root_margin: "0px 0px -100px 0px".to_string(),
            digit_run: DigitRun::First,
            source: ValueSource::Text,
        }
    }

    /// `data-count` counters: value from the attribute, ease-out over 2s.
    pub fn data_count() -> Self {
        Self {
            duration_ms: 2000.0,
            easing: Easing::EaseOutQuad,
            threshold: 0.5,
            root_margin: "0px".to_string(),
            digit_run: DigitRun::First,
            source: ValueSource::Attribute {
                name: "data-count".to_string(),
            },
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_digit_run(mut self, digit_run: DigitRun) -> Self {
        self.digit_run = digit_run;
        self
    }

    /// Parse a (possibly partial) JSON object and validate it.
    pub fn from_json(json: &str) -> Result<Self, CounterError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| CounterError::InvalidConfig {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CounterError> {
        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            return Err(CounterError::InvalidDuration {
                duration_ms: self.duration_ms,
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CounterError::InvalidThreshold {
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}

/// Engine-wide configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings applied by `Engine::register`.
    pub defaults: CounterConfig,
    /// Initial capacity hint for target storage.
    pub capacity_hint: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: CounterConfig::default(),
            capacity_hint: 16,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), CounterError> {
        self.defaults.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(CounterConfig::stat_card().validate().is_ok());
        assert!(CounterConfig::data_count().validate().is_ok());
        assert_eq!(CounterConfig::data_count().duration_ms, 2000.0);
    }

    #[test]
    fn rejects_bad_duration_and_threshold() {
        let zero = CounterConfig::default().with_duration(0.0);
        assert_eq!(
            zero.validate(),
            Err(CounterError::InvalidDuration { duration_ms: 0.0 })
        );
        assert!(CounterConfig::default()
            .with_duration(f64::INFINITY)
            .validate()
            .is_err());
        assert!(CounterConfig::default()
            .with_threshold(1.5)
            .validate()
            .is_err());
        assert!(CounterConfig::default()
            .with_threshold(0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn from_json_rejects_garbage_and_invalid_values() {
        assert!(matches!(
            CounterConfig::from_json("not json"),
            Err(CounterError::InvalidConfig { .. })
        ));
        assert!(matches!(
            CounterConfig::from_json(r#"{"threshold": -0.1}"#),
            Err(CounterError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg =
            CounterConfig::from_json(r#"{"duration_ms": 2000, "easing": {"type": "ease_out_quad"}}"#)
                .unwrap();
        assert_eq!(cfg.duration_ms, 2000.0);
        assert_eq!(cfg.easing.name(), "ease_out_quad");
        assert_eq!(cfg.threshold, 0.5);
        assert_eq!(cfg.source, ValueSource::Text);

        let attr =
            CounterConfig::from_json(r#"{"source": {"kind": "attribute", "name": "data-count"}}"#)
                .unwrap();
        assert_eq!(
            attr.source,
            ValueSource::Attribute {
                name: "data-count".into()
            }
        );
    }
}
