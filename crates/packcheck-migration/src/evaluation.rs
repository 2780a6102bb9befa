//! # Migration Evaluation
//!
//! Worst-case migration estimate and its classification against each
//! regulation's specific migration limit (SML).
//!
//! ```text
//! M = (Q × A × Lp × D) / F
//! ```
//!
//! `Q` is the contamination of the packaging material (mg/kg), `A` the
//! contact area (cm²), `Lp` the thickness (cm), `D` the density (g/cm³) and
//! `F` the food mass (g). `M` is in mg/kg of food.
//!
//! ## Boundary
//!
//! A limit passes only when `M < SML`. An M exactly equal to the SML fails.
//! This matches the behaviour of the system these results are compared
//! against and must not change without sign-off from a compliance expert.
//!
//! No rounding happens here; formatting is the caller's concern.

use packcheck_core::ValidationError;
use serde::{Deserialize, Serialize};

use crate::parameters::PackagingParameters;
use crate::substance::{RegulatoryLimit, Substance};

/// Tri-state classification of an M value against one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// M is strictly below the SML.
    Pass,
    /// M is at or above the SML.
    Fail,
    /// No usable SML is known, so compliance cannot be determined.
    Unknown,
}

impl Verdict {
    /// `Some(true)` for pass, `Some(false)` for fail, `None` when unknown.
    pub fn passed(self) -> Option<bool> {
        match self {
            Self::Pass => Some(true),
            Self::Fail => Some(false),
            Self::Unknown => None,
        }
    }

    /// Lowercase label used in exports and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one substance against one regulatory limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimitOutcome<'a> {
    /// The limit that was applied.
    pub limit: &'a RegulatoryLimit,
    /// Outcome of the comparison.
    pub verdict: Verdict,
}

/// Calculator output for one substance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult<'a> {
    /// The substance the estimate was computed for.
    pub substance: &'a Substance,
    /// Estimated migration into food (mg/kg).
    pub m_value: f64,
    /// One outcome per applicable limit, in the substance's limit order.
    pub limit_outcomes: Vec<LimitOutcome<'a>>,
}

impl CalculationResult<'_> {
    /// Whether any limit was exceeded.
    pub fn any_failed(&self) -> bool {
        self.limit_outcomes.iter().any(|o| o.verdict == Verdict::Fail)
    }
}

/// Compute the worst-case migration estimate for one contamination level.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositiveParameter`] if any packaging
/// parameter is not a finite number greater than zero. A zero food mass is
/// reported instead of producing an infinite result. In-range inputs whose
/// product overflows yield [`ValidationError::NonFiniteEstimate`].
pub fn compute_m_value(
    params: &PackagingParameters,
    contamination: f64,
) -> Result<f64, ValidationError> {
    params.validate()?;
    m_value(params, contamination, "")
}

fn m_value(
    params: &PackagingParameters,
    contamination: f64,
    substance: &str,
) -> Result<f64, ValidationError> {
    let m =
        (contamination * params.surface_area * params.thickness * params.density) / params.food_mass;
    if !m.is_finite() {
        return Err(ValidationError::NonFiniteEstimate {
            substance: substance.to_string(),
            value: m,
        });
    }
    Ok(m)
}

/// Classify an M value against a single limit.
///
/// A missing, non-finite, zero, or negative SML yields [`Verdict::Unknown`].
/// Otherwise the limit passes only when `m_value < sml` (equality fails).
pub fn classify(m_value: f64, limit: &RegulatoryLimit) -> LimitOutcome<'_> {
    let verdict = match limit.usable_sml() {
        None => Verdict::Unknown,
        Some(sml) if m_value < sml => Verdict::Pass,
        Some(_) => Verdict::Fail,
    };
    LimitOutcome { limit, verdict }
}

/// Evaluate every substance against its applicable limits.
///
/// Results come back in input order, and each result's outcomes follow the
/// order of `applicable_limits`. A substance with no limits yields an empty
/// outcome list.
///
/// # Errors
///
/// Invalid packaging parameters abort the whole batch: the parameters are
/// shared by every substance, so no partial results are returned. The same
/// holds when any substance's estimate overflows.
pub fn evaluate<'a>(
    params: &PackagingParameters,
    substances: &'a [Substance],
) -> Result<Vec<CalculationResult<'a>>, ValidationError> {
    params.validate()?;

    let results = substances
        .iter()
        .map(|substance| {
            let m = m_value(params, substance.contamination, &substance.identifier)?;
            let limit_outcomes = substance
                .applicable_limits
                .iter()
                .map(|limit| classify(m, limit))
                .collect();
            Ok(CalculationResult {
                substance,
                m_value: m,
                limit_outcomes,
            })
        })
        .collect::<Result<Vec<CalculationResult<'a>>, ValidationError>>()?;

    tracing::debug!(
        substances = results.len(),
        failed = results.iter().filter(|r| r.any_failed()).count(),
        "migration batch evaluated"
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> PackagingParameters {
        PackagingParameters {
            surface_area: 600.0,
            thickness: 0.1,
            density: 1.0,
            food_mass: 1000.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn scenario_m_value() {
        let m = compute_m_value(&scenario(), 5.0).unwrap();
        assert!(close(m, 0.3), "expected 0.3, got {m}");
    }

    #[test]
    fn scenario_classification() {
        let m = compute_m_value(&scenario(), 5.0).unwrap();
        let above = RegulatoryLimit::new("a", "A", 0.5);
        let absent = RegulatoryLimit::without_sml("c", "C");
        assert_eq!(classify(m, &above).verdict, Verdict::Pass);
        assert_eq!(classify(m, &absent).verdict, Verdict::Unknown);
    }

    #[test]
    fn scenario_equal_sml_fails() {
        // Same expression the calculator uses, so the comparison is exact.
        let m = compute_m_value(&scenario(), 5.0).unwrap();
        let at = RegulatoryLimit::new("b", "B", m);
        assert_eq!(classify(m, &at).verdict, Verdict::Fail);

        let literal = RegulatoryLimit::new("b", "B", 0.3);
        let outcome = classify(0.3, &literal);
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert_eq!(outcome.verdict.passed(), Some(false));
    }

    #[test]
    fn zero_food_mass_is_validation_error() {
        let mut p = scenario();
        p.food_mass = 0.0;
        let err = compute_m_value(&p, 5.0).unwrap_err();
        assert_eq!(err.field(), Some("food_mass"));
    }

    #[test]
    fn degenerate_sml_is_unknown() {
        for sml in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let limit = RegulatoryLimit::new("r", "R", sml);
            assert_eq!(classify(0.1, &limit).verdict, Verdict::Unknown, "sml {sml}");
        }
    }

    #[test]
    fn classify_returns_the_given_limit() {
        let limit = RegulatoryLimit::new("eu", "EU 10/2011", 0.05);
        let outcome = classify(0.01, &limit);
        assert!(std::ptr::eq(outcome.limit, &limit));
        assert_eq!(limit.sml_value, Some(0.05));
    }

    #[test]
    fn evaluate_preserves_order_and_empty_limits() {
        let substances = vec![
            Substance::new("s1", "First", 5.0)
                .with_limit(RegulatoryLimit::new("r1", "R1", 0.5))
                .with_limit(RegulatoryLimit::new("r2", "R2", 0.3))
                .with_limit(RegulatoryLimit::without_sml("r3", "R3")),
            Substance::new("s2", "Second", 1.0),
            Substance::new("s3", "", 0.0).with_limit(RegulatoryLimit::new("r1", "R1", 0.01)),
        ];
        let results = evaluate(&scenario(), &substances).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.substance.identifier.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);

        let verdicts: Vec<Verdict> = results[0].limit_outcomes.iter().map(|o| o.verdict).collect();
        assert_eq!(verdicts, vec![Verdict::Pass, Verdict::Fail, Verdict::Unknown]);
        let regs: Vec<&str> = results[0]
            .limit_outcomes
            .iter()
            .map(|o| o.limit.regulation_id.as_str())
            .collect();
        assert_eq!(regs, vec!["r1", "r2", "r3"]);

        assert!(results[1].limit_outcomes.is_empty());
        assert!(close(results[1].m_value, 0.06));

        assert_eq!(results[2].m_value, 0.0);
        assert_eq!(results[2].limit_outcomes[0].verdict, Verdict::Pass);
    }

    #[test]
    fn evaluate_rejects_invalid_params_without_partial_results() {
        let mut p = scenario();
        p.food_mass = 0.0;
        let substances = vec![Substance::new("s1", "First", 5.0)];
        assert!(evaluate(&p, &substances).is_err());
        assert!(evaluate(&p, &[]).is_err());
    }

    #[test]
    fn overflowing_estimate_is_validation_error() {
        let p = PackagingParameters {
            surface_area: 1e200,
            thickness: 1e200,
            density: 1.0,
            food_mass: 1.0,
        };
        assert!(p.validate().is_ok());
        let err = compute_m_value(&p, 5.0).unwrap_err();
        assert!(matches!(err, ValidationError::NonFiniteEstimate { value, .. } if value.is_infinite()));
    }

    #[test]
    fn evaluate_rejects_overflow_without_partial_results() {
        let p = PackagingParameters {
            surface_area: 1e200,
            thickness: 1e200,
            density: 1.0,
            food_mass: 1.0,
        };
        // Zero contamination stays finite; the second substance overflows.
        let substances = vec![
            Substance::new("s1", "Clean", 0.0).with_limit(RegulatoryLimit::new("r", "R", 0.5)),
            Substance::new("s2", "Overflow", 5.0).with_limit(RegulatoryLimit::new("r", "R", 0.5)),
        ];
        let err = evaluate(&p, &substances).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonFiniteEstimate {
                substance: "s2".to_string(),
                value: f64::INFINITY,
            }
        );
        assert!(evaluate(&p, &substances[..1]).is_ok());
    }

    #[test]
    fn evaluate_ignores_display_fields() {
        let a = Substance::new("a", "", 2.0).with_cas("not-a-cas");
        let b = Substance::new("b", "Named", 2.0);
        let substances = vec![a, b];
        let results = evaluate(&scenario(), &substances).unwrap();
        assert_eq!(results[0].m_value, results[1].m_value);
    }

    #[test]
    fn any_failed_reports_exceedances() {
        let substances = vec![Substance::new("s", "S", 5.0)
            .with_limit(RegulatoryLimit::new("r", "R", 0.1))];
        let results = evaluate(&scenario(), &substances).unwrap();
        assert!(results[0].any_failed());
    }

    #[test]
    fn verdict_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Verdict::Unknown).unwrap(), "\"unknown\"");
        assert_eq!(Verdict::Pass.to_string(), "pass");
        assert_eq!(Verdict::Unknown.passed(), None);
    }
}
