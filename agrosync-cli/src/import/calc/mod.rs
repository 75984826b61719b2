//! Derived field calculator
//!
//! Pure computation over one row's raw analysis measurements: cation
//! balance, saturation ratios, lime and fertilizer requirements, texture
//! class and the fertility report. Invoked only for the analysis dataset and
//! recomputed fresh for every row.

pub mod fertility;
pub mod texture;

use crate::import::value::WorkingRecord;

pub use fertility::{classify_all, classify_phosphorus, FertilityInputs, FertilityReport};
pub use texture::{classify as classify_texture, TextureClass};

/// Conversion divisor from mg/dm3 of extracted potassium to cmolc/dm3
pub const K_CHARGE_DIVISOR: f64 = 391.0;

/// Base saturation target for the lime requirement
pub const TARGET_BASE_SATURATION: f64 = 45.0;

/// Fraction of CEC at pH 7 that potassium should occupy
pub const K_CEC_FRACTION: f64 = 0.03;

/// One band of the clay table used for the phosphorus deficit
#[derive(Debug, Clone, Copy)]
struct ClayBand {
    /// Upper clay% bound of the band (exclusive, except for the last)
    max_clay: f64,
    /// Mehlich-P level below which a deficit exists (mg/dm3)
    critical_p: f64,
    /// Multiplier converting the concentration gap to a per-area dose
    coefficient: f64,
}

// Ten non-overlapping bands over 0-70% clay. Critical levels fall and
// coefficients rise with clay content (heavier soils fix more phosphorus).
// Clay above 70% uses the last band.
const CLAY_BANDS: [ClayBand; 10] = [
    ClayBand { max_clay: 7.0, critical_p: 33.0, coefficient: 1.0 },
    ClayBand { max_clay: 14.0, critical_p: 30.0, coefficient: 1.2 },
    ClayBand { max_clay: 21.0, critical_p: 27.0, coefficient: 1.4 },
    ClayBand { max_clay: 28.0, critical_p: 24.0, coefficient: 1.6 },
    ClayBand { max_clay: 35.0, critical_p: 21.0, coefficient: 1.9 },
    ClayBand { max_clay: 42.0, critical_p: 18.0, coefficient: 2.2 },
    ClayBand { max_clay: 49.0, critical_p: 15.0, coefficient: 2.6 },
    ClayBand { max_clay: 56.0, critical_p: 12.0, coefficient: 3.0 },
    ClayBand { max_clay: 63.0, critical_p: 9.0, coefficient: 3.5 },
    ClayBand { max_clay: 70.0, critical_p: 6.0, coefficient: 4.0 },
];

fn clay_band(clay_pct: f64) -> &'static ClayBand {
    CLAY_BANDS
        .iter()
        .find(|band| clay_pct < band.max_clay)
        .unwrap_or(&CLAY_BANDS[9])
}

/// Raw measurements feeding the calculator (lab units: cmolc/dm3 for the
/// cations and acidity, mg/dm3 for potassium and phosphorus, g/kg for the
/// granulometry fractions).
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisInputs {
    pub calcium: f64,
    pub magnesium: f64,
    pub potassium_raw: f64,
    pub aluminum: f64,
    pub potential_acidity: f64,
    pub sand: f64,
    pub silt: f64,
    pub clay: f64,
    pub phosphorus: f64,
}

impl AnalysisInputs {
    /// Read the inputs out of a mapped working record; unset fields read as
    /// zero per the coercion rules.
    pub fn from_record(record: &WorkingRecord) -> Self {
        Self {
            calcium: record.number_or_zero("calcium"),
            magnesium: record.number_or_zero("magnesium"),
            potassium_raw: record.number_or_zero("potassium_raw"),
            aluminum: record.number_or_zero("aluminum"),
            potential_acidity: record.number_or_zero("potential_acidity"),
            sand: record.number_or_zero("sand"),
            silt: record.number_or_zero("silt"),
            clay: record.number_or_zero("clay"),
            phosphorus: record.number_or_zero("phosphorus"),
        }
    }
}

/// The computed measurement set. Ratio-derived values are `None` when the
/// arithmetic failed (zero denominators); those fields stay unset on the
/// record instead of aborting the row.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMeasurements {
    pub potassium: f64,
    pub sum_of_bases: f64,
    pub cec_effective: f64,
    pub cec_ph7: f64,
    pub base_saturation: Option<f64>,
    pub aluminum_saturation: Option<f64>,
    pub lime_requirement: Option<f64>,
    pub phosphorus_deficit: f64,
    pub potassium_deficit: f64,
    pub texture: TextureClass,
}

/// Compute the full derived set for one row
pub fn derive(inputs: &AnalysisInputs) -> DerivedMeasurements {
    let potassium = inputs.potassium_raw / K_CHARGE_DIVISOR;
    let sum_of_bases = inputs.calcium + inputs.magnesium + potassium;
    let cec_effective = sum_of_bases + inputs.aluminum;
    let cec_ph7 = sum_of_bases + inputs.potential_acidity;

    let base_saturation = finite(sum_of_bases / cec_ph7 * 100.0, "base_saturation");
    let aluminum_saturation =
        finite(inputs.aluminum / cec_effective * 100.0, "aluminum_saturation");

    let lime_requirement = base_saturation.map(|v| {
        if v < TARGET_BASE_SATURATION {
            (TARGET_BASE_SATURATION - v) * cec_ph7 / 100.0
        } else {
            0.0
        }
    });

    let clay_pct = inputs.clay / 10.0;
    let band = clay_band(clay_pct);
    let phosphorus_deficit = if inputs.phosphorus < band.critical_p {
        (band.critical_p - inputs.phosphorus) * band.coefficient
    } else {
        0.0
    };

    // Deficit is computed from the charge-equivalent potassium, converted
    // back to the raw unit for the dose.
    let k_target = cec_ph7 * K_CEC_FRACTION;
    let potassium_deficit = if potassium < k_target {
        (k_target - potassium) * K_CHARGE_DIVISOR * 1.2 * 2.0
    } else {
        0.0
    };

    let texture = classify_texture(inputs.sand / 10.0, inputs.silt / 10.0, inputs.clay / 10.0);

    DerivedMeasurements {
        potassium,
        sum_of_bases,
        cec_effective,
        cec_ph7,
        base_saturation,
        aluminum_saturation,
        lime_requirement,
        phosphorus_deficit,
        potassium_deficit,
        texture,
    }
}

fn finite(value: f64, what: &str) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        log::warn!("calculation of {} produced a non-finite value, leaving unset", what);
        None
    }
}

impl DerivedMeasurements {
    /// Merge the computed values into the working record. Failed values stay
    /// unset; the per-plot variants are filled later by the reference
    /// resolver once the plot area is known.
    pub fn apply(&self, record: &mut WorkingRecord) {
        record.set_finite("potassium", self.potassium);
        record.set_finite("sum_of_bases", self.sum_of_bases);
        record.set_finite("cec_effective", self.cec_effective);
        record.set_finite("cec_ph7", self.cec_ph7);
        if let Some(v) = self.base_saturation {
            record.set_finite("base_saturation", v);
        }
        if let Some(v) = self.aluminum_saturation {
            record.set_finite("aluminum_saturation", v);
        }
        if let Some(v) = self.lime_requirement {
            record.set_finite("lime_requirement", v);
        }
        record.set_finite("phosphorus_deficit", self.phosphorus_deficit);
        record.set_finite("potassium_deficit", self.potassium_deficit);
        record.set(
            "texture_class",
            crate::import::value::Value::Text(self.texture.label().to_string()),
        );
    }

    /// Assemble the classification inputs from the raw measurements and the
    /// already-derived values.
    pub fn fertility_inputs(&self, record: &WorkingRecord) -> FertilityInputs {
        FertilityInputs {
            ph: record.number_or_zero("ph"),
            calcium: record.number_or_zero("calcium"),
            magnesium: record.number_or_zero("magnesium"),
            potassium_raw: record.number_or_zero("potassium_raw"),
            sum_of_bases: self.sum_of_bases,
            cec_effective: self.cec_effective,
            cec_ph7: self.cec_ph7,
            base_saturation: self.base_saturation.unwrap_or(0.0),
            sulfur: record.number_or_zero("sulfur"),
            aluminum: record.number_or_zero("aluminum"),
            potential_acidity: record.number_or_zero("potential_acidity"),
            zinc: record.number_or_zero("zinc"),
            boron: record.number_or_zero("boron"),
            copper: record.number_or_zero("copper"),
            iron: record.number_or_zero("iron"),
            manganese: record.number_or_zero("manganese"),
            phosphorus: record.number_or_zero("phosphorus"),
            clay_pct: record.number_or_zero("clay") / 10.0,
        }
    }
}
