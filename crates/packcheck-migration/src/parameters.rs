//! # Packaging Parameters
//!
//! The four physical quantities describing a food-contact scenario. They are
//! shared by every substance in one calculation request, so a single bad
//! value invalidates the whole batch.

use packcheck_core::ValidationError;
use serde::{Deserialize, Serialize};

/// Food-contact scenario: packaging geometry and the food it touches.
///
/// Non-positive values are representable (the struct is plain data and is
/// deserialized from user input), but [`PackagingParameters::validate`]
/// rejects them and the calculator refuses to run on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackagingParameters {
    /// Contact area between packaging and food (A, cm²).
    pub surface_area: f64,
    /// Packaging material thickness (Lp, cm).
    pub thickness: f64,
    /// Packaging material density (D, g/cm³).
    pub density: f64,
    /// Mass of food in contact (F, g).
    pub food_mass: f64,
}

impl PackagingParameters {
    /// Build a parameter set, rejecting any value that is not strictly positive.
    pub fn new(
        surface_area: f64,
        thickness: f64,
        density: f64,
        food_mass: f64,
    ) -> Result<Self, ValidationError> {
        let params = Self {
            surface_area,
            thickness,
            density,
            food_mass,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that every parameter is a finite number greater than zero.
    ///
    /// Fields are checked in declaration order and the first offender is
    /// reported. NaN and infinities are rejected along with zero and
    /// negative values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("surface_area", self.surface_area),
            ("thickness", self.thickness),
            ("density", self.density),
            ("food_mass", self.food_mass),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ValidationError::NonPositiveParameter { field, value });
            }
        }
        Ok(())
    }
}
