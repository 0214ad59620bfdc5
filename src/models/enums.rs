use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Named group of biomarkers reported together on one lab document.
    Panel {
        MetabolicPanel => "metabolic_panel",
        CompleteBloodCount => "complete_blood_count",
        Glucose => "glucose",
    }
);

str_enum!(
    /// Every biomarker the matcher knows how to extract.
    Biomarker {
        Glucose => "glucose",
        Sodium => "sodium",
        Potassium => "potassium",
        Chloride => "chloride",
        Co2 => "co2",
        Bun => "bun",
        Creatinine => "creatinine",
        Calcium => "calcium",
        Egfr => "egfr",
        Wbc => "wbc",
        Rbc => "rbc",
        Hemoglobin => "hemoglobin",
        Hematocrit => "hematocrit",
        Mcv => "mcv",
        Mch => "mch",
        Mchc => "mchc",
        Rdw => "rdw",
        Platelets => "platelets",
        Neutrophils => "neutrophils",
        Lymphocytes => "lymphocytes",
        Monocytes => "monocytes",
        Eosinophils => "eosinophils",
        Basophils => "basophils",
    }
);

str_enum!(LabFlag {
    Low => "low",
    Normal => "normal",
    High => "high",
    Unknown => "unknown",
});

str_enum!(
    /// Daily wearable fields, in export column order.
    WearableMetric {
        RecoveryScore => "recovery_score",
        HrvRmssd => "hrv_rmssd",
        RestingHr => "resting_hr",
        Spo2 => "spo2",
        SkinTemp => "skin_temp",
        SleepPerformance => "sleep_performance",
        SleepEfficiency => "sleep_efficiency",
        SleepConsistency => "sleep_consistency",
        TotalSleepHours => "total_sleep_hours",
        LightSleepHours => "light_sleep_hours",
        DeepSleepHours => "deep_sleep_hours",
        RemSleepHours => "rem_sleep_hours",
        AwakeHours => "awake_hours",
        RespiratoryRate => "respiratory_rate",
        DayStrain => "day_strain",
        AvgHr => "avg_hr",
        MaxHr => "max_hr",
        Kilojoules => "kilojoules",
    }
);

str_enum!(
    /// Sign of a correlation coefficient; `None` when no coefficient exists.
    Direction {
        Positive => "positive",
        Negative => "negative",
        None => "none",
    }
);

str_enum!(
    /// Change of a field's mean from the pre-event to the post-event interval.
    Trend {
        Increase => "increase",
        Decrease => "decrease",
        Unchanged => "unchanged",
        Insufficient => "insufficient",
    }
);

impl Direction {
    pub fn from_coefficient(coefficient: Option<f64>) -> Self {
        match coefficient {
            Some(r) if r > 0.0 => Self::Positive,
            Some(r) if r < 0.0 => Self::Negative,
            _ => Self::None,
        }
    }
}

/// Any field a grid row can carry: a wearable metric or a lab biomarker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricField {
    Wearable(WearableMetric),
    Lab(Biomarker),
}

impl MetricField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wearable(m) => m.as_str(),
            Self::Lab(b) => b.as_str(),
        }
    }
}

impl std::str::FromStr for MetricField {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(m) = s.parse::<WearableMetric>() {
            return Ok(Self::Wearable(m));
        }
        if let Ok(b) = s.parse::<Biomarker>() {
            return Ok(Self::Lab(b));
        }
        Err(InvalidEnum {
            field: "MetricField".into(),
            value: s.into(),
        })
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetricField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
