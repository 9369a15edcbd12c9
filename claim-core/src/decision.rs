use serde::{Deserialize, Serialize};

use crate::detection::{DamageClass, Detection};

/// Overall damage verdict: the dominating class, or `none` when the
/// detector found nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalDamage {
    None,
    Scratch,
    Dent,
    Broken,
    Severe,
}

impl From<DamageClass> for FinalDamage {
    fn from(class: DamageClass) -> Self {
        match class {
            DamageClass::Scratch => FinalDamage::Scratch,
            DamageClass::Dent => FinalDamage::Dent,
            DamageClass::Broken => FinalDamage::Broken,
            DamageClass::Severe => FinalDamage::Severe,
        }
    }
}

impl std::fmt::Display for FinalDamage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalDamage::None => write!(f, "none"),
            FinalDamage::Scratch => write!(f, "scratch"),
            FinalDamage::Dent => write!(f, "dent"),
            FinalDamage::Broken => write!(f, "broken"),
            FinalDamage::Severe => write!(f, "severe"),
        }
    }
}

/// The engine's structured verdict for one set of detections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub final_damage: FinalDamage,
    pub severity_level: u8,
    pub claim_approved: bool,
    pub confidence: f64,
    pub estimated_cost_range: String,
    #[serde(default)]
    pub damage_count: usize,
}

/// Compute the severity/cost decision for a set of detections.
///
/// Pure and deterministic: the same detections always produce the same
/// decision. Cost bounds are truncated to whole rupees after every
/// modifier stage, so the order of stages is part of the contract.
pub fn decide(detections: &[Detection]) -> Decision {
    if detections.is_empty() {
        return Decision {
            final_damage: FinalDamage::None,
            severity_level: 0,
            claim_approved: false,
            confidence: 0.0,
            estimated_cost_range: "₹0".to_string(),
            damage_count: 0,
        };
    }

    let avg_confidence =
        detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64;

    // First occurrence of the highest rank wins; later detections of the
    // same rank never override an earlier pick.
    let mut highest_severity = 0u8;
    let mut final_class = DamageClass::Scratch;
    for d in detections {
        if d.class.severity_rank() > highest_severity {
            highest_severity = d.class.severity_rank();
            final_class = d.class;
        }
    }

    let (mut min_cost, mut max_cost) = final_class.base_cost_range();

    // Severe dominates: its base range takes no count or broken modifiers.
    if final_class != DamageClass::Severe {
        let total_count = detections.len();
        if total_count == 2 {
            min_cost = (min_cost as f64 * 1.2) as i64;
            max_cost = (max_cost as f64 * 1.2) as i64;
        } else if total_count >= 3 {
            min_cost = (min_cost as f64 * 1.4) as i64;
            max_cost = (max_cost as f64 * 1.4) as i64;
        }

        // Broken-part premium on the upper bound only
        if final_class == DamageClass::Broken {
            max_cost = (max_cost as f64 * 1.15) as i64;
        }
    }

    // Confidence-sensitive range adjustment, severe included: low
    // confidence widens the range, high confidence narrows it.
    if avg_confidence < 0.5 {
        let width = (max_cost - min_cost) as f64;
        min_cost = (min_cost as f64 - width * 0.15) as i64;
        max_cost = (max_cost as f64 + width * 0.15) as i64;
    } else if avg_confidence > 0.8 {
        let width = (max_cost - min_cost) as f64;
        min_cost = (min_cost as f64 + width * 0.1) as i64;
        max_cost = (max_cost as f64 - width * 0.1) as i64;
    }

    Decision {
        final_damage: final_class.into(),
        severity_level: highest_severity,
        claim_approved: highest_severity >= 2,
        confidence: (avg_confidence * 100.0).round() / 100.0,
        estimated_cost_range: format!(
            "₹{} – ₹{}",
            format_thousands(min_cost),
            format_thousands(max_cost)
        ),
        damage_count: detections.len(),
    }
}

/// Thousands-separated decimal rendering, e.g. 25000 -> "25,000"
fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{}", out) } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class: DamageClass, confidence: f64) -> Detection {
        Detection::new(class, confidence)
    }

    #[test]
    fn empty_detections_yield_no_damage() {
        let decision = decide(&[]);

        assert_eq!(decision.final_damage, FinalDamage::None);
        assert_eq!(decision.severity_level, 0);
        assert!(!decision.claim_approved);
        assert_eq!(decision.confidence, 0.0);
        assert_eq!(decision.estimated_cost_range, "₹0");
        assert_eq!(decision.damage_count, 0);
    }

    #[test]
    fn single_high_confidence_dent_narrows_range() {
        let decision = decide(&[det(DamageClass::Dent, 0.9)]);

        assert_eq!(decision.final_damage, FinalDamage::Dent);
        assert_eq!(decision.severity_level, 2);
        assert!(decision.claim_approved);
        assert_eq!(decision.confidence, 0.9);
        assert_eq!(decision.estimated_cost_range, "₹2,150 – ₹7,350");
        assert_eq!(decision.damage_count, 1);
    }

    #[test]
    fn two_low_confidence_broken_stack_all_modifiers() {
        // (3000, 15000) x1.2 -> (3600, 18000), broken premium on the
        // upper bound -> 20700, then widened by 0.15 x width on each end.
        let decision = decide(&[
            det(DamageClass::Broken, 0.3),
            det(DamageClass::Broken, 0.3),
        ]);

        assert_eq!(decision.final_damage, FinalDamage::Broken);
        assert_eq!(decision.severity_level, 3);
        assert!(decision.claim_approved);
        assert_eq!(decision.confidence, 0.3);
        assert_eq!(decision.estimated_cost_range, "₹1,035 – ₹23,265");
        assert_eq!(decision.damage_count, 2);
    }

    #[test]
    fn severe_skips_count_and_broken_modifiers() {
        let decision = decide(&[
            det(DamageClass::Severe, 0.9),
            det(DamageClass::Scratch, 0.9),
        ]);

        assert_eq!(decision.final_damage, FinalDamage::Severe);
        assert_eq!(decision.severity_level, 4);
        assert!(decision.claim_approved);
        // Base (25000, 100000) narrowed by high confidence only
        assert_eq!(decision.estimated_cost_range, "₹32,500 – ₹92,500");
    }

    #[test]
    fn severe_still_takes_confidence_widening() {
        let decision = decide(&[det(DamageClass::Severe, 0.4)]);

        assert_eq!(decision.estimated_cost_range, "₹13,750 – ₹111,250");
    }

    #[test]
    fn low_confidence_widening_can_push_lower_bound_negative() {
        let decision = decide(&[
            det(DamageClass::Scratch, 0.2),
            det(DamageClass::Scratch, 0.2),
            det(DamageClass::Scratch, 0.2),
        ]);

        assert_eq!(decision.final_damage, FinalDamage::Scratch);
        assert!(!decision.claim_approved);
        assert_eq!(decision.estimated_cost_range, "₹-245 – ₹7,945");
    }

    #[test]
    fn mid_confidence_single_scratch_uses_base_range() {
        let decision = decide(&[det(DamageClass::Scratch, 0.6)]);

        assert_eq!(decision.estimated_cost_range, "₹500 – ₹5,000");
        assert!(!decision.claim_approved);
    }

    #[test]
    fn pair_of_classes_applies_multiplicity_across_all_detections() {
        // Two detections total, so the x1.2 modifier applies to the
        // dent base range even though only one detection is a dent.
        let decision = decide(&[
            det(DamageClass::Scratch, 0.7),
            det(DamageClass::Dent, 0.7),
        ]);

        assert_eq!(decision.final_damage, FinalDamage::Dent);
        assert_eq!(decision.estimated_cost_range, "₹1,800 – ₹9,600");
    }

    #[test]
    fn broken_premium_applies_to_upper_bound_only() {
        let decision = decide(&[det(DamageClass::Broken, 0.75)]);

        assert_eq!(decision.estimated_cost_range, "₹3,000 – ₹17,250");
    }

    #[test]
    fn first_detection_of_max_rank_wins_ties() {
        let decision = decide(&[
            det(DamageClass::Dent, 0.5),
            det(DamageClass::Dent, 0.9),
            det(DamageClass::Scratch, 0.4),
        ]);

        assert_eq!(decision.final_damage, FinalDamage::Dent);
        assert_eq!(decision.severity_level, 2);
        assert_eq!(decision.confidence, 0.6);
        assert_eq!(decision.estimated_cost_range, "₹2,100 – ₹11,200");
        assert_eq!(decision.damage_count, 3);
    }

    #[test]
    fn high_confidence_triple_narrows_after_multiplicity() {
        let decision = decide(&[
            det(DamageClass::Scratch, 0.9),
            det(DamageClass::Dent, 0.95),
            det(DamageClass::Scratch, 0.85),
        ]);

        assert_eq!(decision.final_damage, FinalDamage::Dent);
        assert_eq!(decision.confidence, 0.9);
        assert_eq!(decision.estimated_cost_range, "₹3,010 – ₹10,290");
    }

    #[test]
    fn approval_tracks_severity_threshold() {
        assert!(!decide(&[det(DamageClass::Scratch, 0.7)]).claim_approved);
        assert!(decide(&[det(DamageClass::Dent, 0.7)]).claim_approved);
        assert!(decide(&[det(DamageClass::Broken, 0.7)]).claim_approved);
        assert!(decide(&[det(DamageClass::Severe, 0.7)]).claim_approved);
    }

    #[test]
    fn decide_is_idempotent() {
        let detections = vec![
            det(DamageClass::Broken, 0.3),
            det(DamageClass::Broken, 0.3),
        ];

        assert_eq!(decide(&detections), decide(&detections));
    }

    #[test]
    fn thousands_formatting() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(500), "500");
        assert_eq!(format_thousands(5_000), "5,000");
        assert_eq!(format_thousands(100_000), "100,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-245), "-245");
    }
}
