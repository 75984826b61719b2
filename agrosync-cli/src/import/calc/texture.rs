//! Soil texture classification
//!
//! Ordered decision tree over (sand%, silt%, clay%). The guards overlap at
//! open/closed boundary edges, so evaluation order is part of the
//! definition: the first matching branch wins and later branches assume the
//! earlier ones did not match. Do not reorder.

/// The twelve texture classes plus the fallback for triples no branch claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureClass {
    VeryClayey,
    Clay,
    SiltyClay,
    SandyClay,
    SiltyClayLoam,
    ClayLoam,
    SandyClayLoam,
    Loam,
    Silt,
    SiltLoam,
    SandyLoam,
    LoamySand,
    Sand,
    Indeterminate,
}

impl TextureClass {
    /// Human-readable label used in submissions and summaries
    pub fn label(&self) -> &'static str {
        match self {
            TextureClass::VeryClayey => "Very Clayey",
            TextureClass::Clay => "Clay",
            TextureClass::SiltyClay => "Silty Clay",
            TextureClass::SandyClay => "Sandy Clay",
            TextureClass::SiltyClayLoam => "Silty Clay Loam",
            TextureClass::ClayLoam => "Clay Loam",
            TextureClass::SandyClayLoam => "Sandy Clay Loam",
            TextureClass::Loam => "Loam",
            TextureClass::Silt => "Silt",
            TextureClass::SiltLoam => "Silt Loam",
            TextureClass::SandyLoam => "Sandy Loam",
            TextureClass::LoamySand => "Loamy Sand",
            TextureClass::Sand => "Sand",
            TextureClass::Indeterminate => "Indeterminate",
        }
    }
}

impl std::fmt::Display for TextureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classify a texture triple. Inputs are percentages (lab values in g/kg are
/// divided by 10 before the guards are tested).
pub fn classify(sand: f64, silt: f64, clay: f64) -> TextureClass {
    if clay >= 60.0 {
        TextureClass::VeryClayey
    } else if clay >= 40.0 && silt >= 40.0 {
        TextureClass::SiltyClay
    } else if clay >= 40.0 && sand < 45.0 && silt < 40.0 {
        TextureClass::Clay
    } else if clay >= 35.0 && sand >= 45.0 {
        TextureClass::SandyClay
    } else if clay >= 27.0 && sand < 20.0 {
        TextureClass::SiltyClayLoam
    } else if clay >= 27.0 && sand < 45.0 {
        TextureClass::ClayLoam
    } else if clay >= 20.0 && sand >= 45.0 && silt < 28.0 {
        TextureClass::SandyClayLoam
    } else if silt >= 80.0 && clay < 12.0 {
        TextureClass::Silt
    } else if silt >= 50.0 {
        TextureClass::SiltLoam
    } else if clay >= 7.0 && silt >= 28.0 && sand <= 52.0 {
        TextureClass::Loam
    } else if silt + 1.5 * clay < 15.0 {
        TextureClass::Sand
    } else if silt + 2.0 * clay < 30.0 {
        TextureClass::LoamySand
    } else if sand >= 45.0 && clay < 20.0 {
        TextureClass::SandyLoam
    } else if clay < 7.0 && silt < 50.0 {
        TextureClass::SandyLoam
    } else {
        TextureClass::Indeterminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_triple_is_clay() {
        // argila 50, areia 30, silte 20 (already divided by 10)
        assert_eq!(classify(30.0, 20.0, 50.0), TextureClass::Clay);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(5.0, 25.0, 70.0), TextureClass::VeryClayey);
        assert_eq!(classify(92.0, 5.0, 3.0), TextureClass::Sand);
        assert_eq!(classify(8.0, 85.0, 7.0), TextureClass::Silt);
    }

    #[test]
    fn test_boundary_priority_very_clayey_wins() {
        // clay exactly 60 with high silt: the first guard claims it before
        // the silty clay branch can.
        assert_eq!(classify(0.0, 40.0, 60.0), TextureClass::VeryClayey);
    }

    #[test]
    fn test_silty_clay_before_clay() {
        assert_eq!(classify(10.0, 45.0, 45.0), TextureClass::SiltyClay);
    }

    #[test]
    fn test_sandy_branches() {
        assert_eq!(classify(50.0, 10.0, 40.0), TextureClass::SandyClay);
        assert_eq!(classify(60.0, 15.0, 25.0), TextureClass::SandyClayLoam);
        assert_eq!(classify(82.0, 10.0, 8.0), TextureClass::LoamySand);
        assert_eq!(classify(65.0, 25.0, 10.0), TextureClass::SandyLoam);
    }

    #[test]
    fn test_loamy_center() {
        assert_eq!(classify(40.0, 40.0, 20.0), TextureClass::Loam);
        assert_eq!(classify(35.0, 35.0, 30.0), TextureClass::ClayLoam);
        assert_eq!(classify(10.0, 60.0, 30.0), TextureClass::SiltyClayLoam);
        assert_eq!(classify(20.0, 65.0, 15.0), TextureClass::SiltLoam);
    }

    #[test]
    fn test_total_function_over_grid() {
        // Every triple yields exactly one class; Indeterminate is the only
        // permitted fallback.
        for sand in (0..=100).step_by(5) {
            for clay in (0..=(100 - sand)).step_by(5) {
                let silt = 100 - sand - clay;
                let _ = classify(sand as f64, silt as f64, clay as f64);
            }
        }
    }
}
