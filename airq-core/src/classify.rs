use crate::model::Pollutant;

/// Upper bounds (inclusive, µg/m³) of the first four bands, one row per
/// [`Pollutant`] in canonical order.
pub const THRESHOLDS: [[u32; 4]; 8] = [
    [4400, 9400, 12400, 15400], // CO
    [20, 40, 60, 80],           // NO
    [40, 70, 150, 200],         // NO₂
    [60, 100, 140, 180],        // O₃
    [20, 80, 250, 350],         // SO₂
    [40, 80, 120, 160],         // NH₃
    [10, 25, 50, 75],           // PM2.5
    [20, 50, 100, 200],         // PM10
];

/// Five-step scale shared by the overall AQI and each pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Good = 0,
    Fair = 1,
    Moderate = 2,
    Poor = 3,
    VeryPoor = 4,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Good,
        Severity::Fair,
        Severity::Moderate,
        Severity::Poor,
        Severity::VeryPoor,
    ];

    pub const fn band(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Good => "Good",
            Severity::Fair => "Fair",
            Severity::Moderate => "Moderate",
            Severity::Poor => "Poor",
            Severity::VeryPoor => "Very Poor",
        }
    }
}

/// Classify a concentration against its pollutant's threshold row.
///
/// The value is truncated toward zero before comparing, so `t + 0.9` still
/// lands in the band whose upper bound is `t`. Negative and NaN values
/// saturate to zero and classify as [`Severity::Good`].
pub fn classify(kind: Pollutant, value: f64) -> Severity {
    let v = value as u32;
    let above = THRESHOLDS[kind.index()].iter().take_while(|&&t| t < v).count();
    Severity::ALL[above]
}
