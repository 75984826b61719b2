//! Per-nutrient fertility classification
//!
//! Each measured property maps onto a five-level ordinal scale through a
//! fixed threshold table. The boundaries are agronomic domain constants
//! taken from the reference interpretation tables; change them only against
//! the tables themselves. The aluminum and potential-acidity scales are
//! inverted: a low reading is the favorable end.

/// A five-level ordinal scale: four upper bounds and five labels.
/// `classify` walks the bounds in order, so the first bound the value does
/// not exceed decides the class.
struct Scale {
    bounds: [f64; 4],
    labels: [&'static str; 5],
}

impl Scale {
    fn classify(&self, value: f64) -> &'static str {
        for (bound, label) in self.bounds.iter().zip(self.labels.iter()) {
            if value <= *bound {
                return label;
            }
        }
        self.labels[4]
    }
}

const QUALITY: [&str; 5] = ["Very Low", "Low", "Medium", "Good", "Very Good"];
const INTENSITY: [&str; 5] = ["Very Low", "Low", "Medium", "High", "Very High"];

const PH: Scale = Scale { bounds: [4.5, 5.0, 5.5, 6.0], labels: QUALITY };
const CALCIUM: Scale = Scale { bounds: [0.4, 1.2, 2.4, 4.0], labels: QUALITY };
const MAGNESIUM: Scale = Scale { bounds: [0.15, 0.45, 0.9, 1.5], labels: QUALITY };
// Potassium is classified on the raw extract value (mg/dm3), not the
// charge-equivalent used in the cation balance.
const POTASSIUM: Scale = Scale { bounds: [15.0, 40.0, 70.0, 120.0], labels: QUALITY };
const SUM_OF_BASES: Scale = Scale { bounds: [0.6, 1.8, 3.6, 6.0], labels: QUALITY };
const CEC_EFFECTIVE: Scale = Scale { bounds: [0.8, 2.3, 4.6, 8.0], labels: QUALITY };
const CEC_PH7: Scale = Scale { bounds: [1.6, 4.3, 8.6, 15.0], labels: QUALITY };
const BASE_SATURATION: Scale = Scale { bounds: [20.0, 40.0, 60.0, 80.0], labels: QUALITY };
const SULFUR: Scale = Scale { bounds: [2.5, 5.0, 10.0, 15.0], labels: QUALITY };
// Inverted scales: the low end is favorable.
const ALUMINUM: Scale = Scale { bounds: [0.2, 0.5, 1.0, 2.0], labels: INTENSITY };
const POTENTIAL_ACIDITY: Scale = Scale { bounds: [1.0, 2.5, 5.0, 9.0], labels: INTENSITY };
const ZINC: Scale = Scale { bounds: [0.5, 0.9, 1.5, 2.2], labels: INTENSITY };
const BORON: Scale = Scale { bounds: [0.15, 0.35, 0.6, 0.9], labels: INTENSITY };
const COPPER: Scale = Scale { bounds: [0.3, 0.7, 1.2, 1.8], labels: INTENSITY };
const IRON: Scale = Scale { bounds: [8.0, 18.0, 30.0, 45.0], labels: INTENSITY };
const MANGANESE: Scale = Scale { bounds: [2.0, 5.0, 8.0, 12.0], labels: INTENSITY };

// Mehlich phosphorus availability depends on how much of it the clay
// fraction fixes, so the thresholds come in four clay brackets.
const P_CLAY_HIGH: Scale = Scale { bounds: [2.7, 5.4, 8.0, 12.0], labels: QUALITY };
const P_CLAY_MEDIUM: Scale = Scale { bounds: [4.0, 8.0, 12.0, 18.0], labels: QUALITY };
const P_CLAY_LOW: Scale = Scale { bounds: [6.6, 12.0, 20.0, 30.0], labels: QUALITY };
const P_CLAY_SANDY: Scale = Scale { bounds: [10.0, 20.0, 30.0, 45.0], labels: QUALITY };

/// Classify Mehlich-extracted phosphorus against the bracket for the given
/// clay percentage (same brackets the deficit table groups into).
pub fn classify_phosphorus(p_meh: f64, clay_pct: f64) -> &'static str {
    let scale = if clay_pct > 60.0 {
        &P_CLAY_HIGH
    } else if clay_pct > 35.0 {
        &P_CLAY_MEDIUM
    } else if clay_pct > 15.0 {
        &P_CLAY_LOW
    } else {
        &P_CLAY_SANDY
    };
    scale.classify(p_meh)
}

/// Classification labels for the seventeen measured/derived properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FertilityReport {
    pub ph: &'static str,
    pub calcium: &'static str,
    pub magnesium: &'static str,
    pub potassium: &'static str,
    pub sum_of_bases: &'static str,
    pub cec_effective: &'static str,
    pub cec_ph7: &'static str,
    pub base_saturation: &'static str,
    pub sulfur: &'static str,
    pub aluminum: &'static str,
    pub potential_acidity: &'static str,
    pub zinc: &'static str,
    pub boron: &'static str,
    pub copper: &'static str,
    pub iron: &'static str,
    pub manganese: &'static str,
    pub phosphorus: &'static str,
}

/// Measured values feeding the classification (lab units)
#[derive(Debug, Clone, Copy, Default)]
pub struct FertilityInputs {
    pub ph: f64,
    pub calcium: f64,
    pub magnesium: f64,
    pub potassium_raw: f64,
    pub sum_of_bases: f64,
    pub cec_effective: f64,
    pub cec_ph7: f64,
    pub base_saturation: f64,
    pub sulfur: f64,
    pub aluminum: f64,
    pub potential_acidity: f64,
    pub zinc: f64,
    pub boron: f64,
    pub copper: f64,
    pub iron: f64,
    pub manganese: f64,
    pub phosphorus: f64,
    pub clay_pct: f64,
}

/// Run all seventeen classifiers
pub fn classify_all(inputs: &FertilityInputs) -> FertilityReport {
    FertilityReport {
        ph: PH.classify(inputs.ph),
        calcium: CALCIUM.classify(inputs.calcium),
        magnesium: MAGNESIUM.classify(inputs.magnesium),
        potassium: POTASSIUM.classify(inputs.potassium_raw),
        sum_of_bases: SUM_OF_BASES.classify(inputs.sum_of_bases),
        cec_effective: CEC_EFFECTIVE.classify(inputs.cec_effective),
        cec_ph7: CEC_PH7.classify(inputs.cec_ph7),
        base_saturation: BASE_SATURATION.classify(inputs.base_saturation),
        sulfur: SULFUR.classify(inputs.sulfur),
        aluminum: ALUMINUM.classify(inputs.aluminum),
        potential_acidity: POTENTIAL_ACIDITY.classify(inputs.potential_acidity),
        zinc: ZINC.classify(inputs.zinc),
        boron: BORON.classify(inputs.boron),
        copper: COPPER.classify(inputs.copper),
        iron: IRON.classify(inputs.iron),
        manganese: MANGANESE.classify(inputs.manganese),
        phosphorus: classify_phosphorus(inputs.phosphorus, inputs.clay_pct),
    }
}

impl FertilityReport {
    /// Build the dependent classification submission payload
    pub fn to_payload(&self, code: &str) -> serde_json::Value {
        serde_json::json!({
            "code": code,
            "ph_class": self.ph,
            "calcium_class": self.calcium,
            "magnesium_class": self.magnesium,
            "potassium_class": self.potassium,
            "sum_of_bases_class": self.sum_of_bases,
            "cec_effective_class": self.cec_effective,
            "cec_ph7_class": self.cec_ph7,
            "base_saturation_class": self.base_saturation,
            "sulfur_class": self.sulfur,
            "aluminum_class": self.aluminum,
            "potential_acidity_class": self.potential_acidity,
            "zinc_class": self.zinc,
            "boron_class": self.boron,
            "copper_class": self.copper,
            "iron_class": self.iron,
            "manganese_class": self.manganese,
            "phosphorus_class": self.phosphorus,
        })
    }
}
