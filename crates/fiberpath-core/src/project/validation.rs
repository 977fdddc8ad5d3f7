//! Field-level validation of project parameters
//!
//! Validation is a presentation concern: the store accepts whatever it is
//! given, while editors run raw input through the parsers here and keep
//! the failures in a [`FieldErrors`] map keyed by field path. Nothing is
//! clamped; a rejected value simply never reaches the store.

use super::layer::{HelicalLayer, HelicalPatch, Layer, LayerId, LayerKind, SkipPatch};
use super::model::{Mandrel, MandrelPatch, Project, Tow, TowPatch};
use std::collections::BTreeMap;

/// Per-field error messages, keyed by field path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(key.into(), message.into());
    }

    /// Drop the error for a field
    pub fn clear(&mut self, key: &str) {
        self.errors.remove(key);
    }

    /// Drop every error whose key starts with `prefix`
    pub fn clear_prefix(&mut self, prefix: &str) {
        self.errors.retain(|k, _| !k.starts_with(prefix));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate `(field, message)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Record `result` under `key`: set on error, clear on success
    pub fn record<T>(&mut self, key: &str, result: &Result<T, String>) {
        match result {
            Ok(_) => self.clear(key),
            Err(message) => self.set(key, message.clone()),
        }
    }

    /// Absorb all entries of another map
    pub fn merge(&mut self, other: FieldErrors) {
        self.errors.extend(other.errors);
    }
}

/// Greatest common divisor
pub fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn parse_number(raw: &str, label: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("{} must be a number", label))
}

fn parse_count(raw: &str, label: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| format!("{} must be a positive integer", label))
}

/// Finite and strictly greater than zero
pub fn check_positive(value: f64, label: &str) -> Result<f64, String> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{} must be greater than 0", label))
    }
}

/// Finite and not negative
pub fn check_non_negative(value: f64, label: &str) -> Result<f64, String> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{} must be 0 or greater", label))
    }
}

/// Any finite value
pub fn check_finite(value: f64, label: &str) -> Result<f64, String> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{} must be a finite number", label))
    }
}

/// Wind angle strictly inside (0, 90)
pub fn check_wind_angle(value: f64) -> Result<f64, String> {
    if value.is_finite() && value > 0.0 && value < 90.0 {
        Ok(value)
    } else {
        Err("Wind angle must be between 0 and 90 degrees".to_string())
    }
}

/// At least one
pub fn check_count(value: u32, label: &str) -> Result<u32, String> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(format!("{} must be a positive integer", label))
    }
}

/// Pattern number and skip index must share no factor
pub fn check_coprime(pattern_number: u32, skip_index: u32) -> Result<(), String> {
    if gcd(pattern_number, skip_index) == 1 {
        Ok(())
    } else {
        Err(format!(
            "Pattern number ({}) and skip index ({}) must be coprime",
            pattern_number, skip_index
        ))
    }
}

/// Editable mandrel fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandrelField {
    Diameter,
    WindLength,
}

impl MandrelField {
    /// Field path used in [`FieldErrors`]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Diameter => "mandrel.diameter",
            Self::WindLength => "mandrel.windLength",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Diameter => "Diameter",
            Self::WindLength => "Wind length",
        }
    }

    fn patch(&self, value: f64) -> MandrelPatch {
        match self {
            Self::Diameter => MandrelPatch {
                diameter: Some(value),
                ..Default::default()
            },
            Self::WindLength => MandrelPatch {
                wind_length: Some(value),
                ..Default::default()
            },
        }
    }
}

/// Parse and validate raw input for a mandrel field
pub fn parse_mandrel_input(field: MandrelField, raw: &str) -> Result<MandrelPatch, String> {
    let value = parse_number(raw, field.label())?;
    check_positive(value, field.label()).map(|v| field.patch(v))
}

/// Editable tow fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowField {
    Width,
    Thickness,
}

impl TowField {
    /// Field path used in [`FieldErrors`]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Width => "tow.width",
            Self::Thickness => "tow.thickness",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Width => "Width",
            Self::Thickness => "Thickness",
        }
    }

    fn patch(&self, value: f64) -> TowPatch {
        match self {
            Self::Width => TowPatch {
                width: Some(value),
                ..Default::default()
            },
            Self::Thickness => TowPatch {
                thickness: Some(value),
                ..Default::default()
            },
        }
    }
}

/// Parse and validate raw input for a tow field
pub fn parse_tow_input(field: TowField, raw: &str) -> Result<TowPatch, String> {
    let value = parse_number(raw, field.label())?;
    check_positive(value, field.label()).map(|v| field.patch(v))
}

/// Editable numeric helical fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelicalField {
    WindAngle,
    PatternNumber,
    SkipIndex,
    LockDegrees,
    LeadInMm,
    LeadOutDegrees,
}

impl HelicalField {
    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Self::WindAngle => "windAngle",
            Self::PatternNumber => "patternNumber",
            Self::SkipIndex => "skipIndex",
            Self::LockDegrees => "lockDegrees",
            Self::LeadInMm => "leadInMM",
            Self::LeadOutDegrees => "leadOutDegrees",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::WindAngle => "Wind angle",
            Self::PatternNumber => "Pattern number",
            Self::SkipIndex => "Skip index",
            Self::LockDegrees => "Lock degrees",
            Self::LeadInMm => "Lead-in",
            Self::LeadOutDegrees => "Lead-out degrees",
        }
    }
}

/// Field path of a layer field
pub fn layer_key(id: LayerId, field: &str) -> String {
    format!("layers.{}.{}", id, field)
}

/// Parse and validate raw input for a helical field
///
/// `current` supplies the other half of the coprimality check.
pub fn parse_helical_input(
    field: HelicalField,
    raw: &str,
    current: &HelicalLayer,
) -> Result<HelicalPatch, String> {
    let label = field.label();
    let mut patch = HelicalPatch::default();
    match field {
        HelicalField::WindAngle => {
            patch.wind_angle = Some(check_wind_angle(parse_number(raw, label)?)?);
        }
        HelicalField::PatternNumber => {
            let value = check_count(parse_count(raw, label)?, label)?;
            check_coprime(value, current.skip_index)?;
            patch.pattern_number = Some(value);
        }
        HelicalField::SkipIndex => {
            let value = check_count(parse_count(raw, label)?, label)?;
            check_coprime(current.pattern_number, value)?;
            patch.skip_index = Some(value);
        }
        HelicalField::LockDegrees => {
            patch.lock_degrees = Some(check_non_negative(parse_number(raw, label)?, label)?);
        }
        HelicalField::LeadInMm => {
            patch.lead_in_mm = Some(check_non_negative(parse_number(raw, label)?, label)?);
        }
        HelicalField::LeadOutDegrees => {
            patch.lead_out_degrees = Some(check_non_negative(parse_number(raw, label)?, label)?);
        }
    }
    Ok(patch)
}

/// Parse and validate raw input for a skip layer's rotation
pub fn parse_skip_input(raw: &str) -> Result<SkipPatch, String> {
    let value = check_finite(parse_number(raw, "Mandrel rotation")?, "Mandrel rotation")?;
    Ok(SkipPatch {
        mandrel_rotation: Some(value),
    })
}

/// Validate a whole mandrel record
pub fn validate_mandrel(mandrel: &Mandrel) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (field, value) in [
        (MandrelField::Diameter, mandrel.diameter),
        (MandrelField::WindLength, mandrel.wind_length),
    ] {
        if let Err(message) = check_positive(value, field.label()) {
            errors.set(field.key(), message);
        }
    }
    errors
}

/// Validate a whole tow record
pub fn validate_tow(tow: &Tow) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (field, value) in [
        (TowField::Width, tow.width),
        (TowField::Thickness, tow.thickness),
    ] {
        if let Err(message) = check_positive(value, field.label()) {
            errors.set(field.key(), message);
        }
    }
    errors
}

/// Validate one layer against its variant's rule set
pub fn validate_layer(layer: &Layer) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let id = layer.id();
    match layer.kind() {
        LayerKind::Hoop(_) => {}
        LayerKind::Helical(h) => {
            let key = |f: HelicalField| layer_key(id, f.name());
            if let Err(m) = check_wind_angle(h.wind_angle) {
                errors.set(key(HelicalField::WindAngle), m);
            }
            let pattern = check_count(h.pattern_number, HelicalField::PatternNumber.label());
            let skip = check_count(h.skip_index, HelicalField::SkipIndex.label());
            if let Err(m) = &pattern {
                errors.set(key(HelicalField::PatternNumber), m.clone());
            }
            if let Err(m) = &skip {
                errors.set(key(HelicalField::SkipIndex), m.clone());
            }
            if let (Ok(p), Ok(s)) = (pattern, skip) {
                if let Err(m) = check_coprime(p, s) {
                    errors.set(key(HelicalField::SkipIndex), m);
                }
            }
            for (field, value) in [
                (HelicalField::LockDegrees, h.lock_degrees),
                (HelicalField::LeadInMm, h.lead_in_mm),
                (HelicalField::LeadOutDegrees, h.lead_out_degrees),
            ] {
                if let Err(m) = check_non_negative(value, field.label()) {
                    errors.set(key(field), m);
                }
            }
        }
        LayerKind::Skip(s) => {
            if let Err(m) = check_finite(s.mandrel_rotation, "Mandrel rotation") {
                errors.set(layer_key(id, "mandrelRotation"), m);
            }
        }
    }
    errors
}

/// Validate everything the user can edit in a project
pub fn validate_project(project: &Project) -> FieldErrors {
    let mut errors = validate_mandrel(&project.mandrel);
    errors.merge(validate_tow(&project.tow));
    for layer in &project.layers {
        errors.merge(validate_layer(layer));
    }
    errors
}
