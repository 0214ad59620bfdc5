use serde::{Deserialize, Serialize};

use super::enums::WearableMetric;

/// One calendar day of wearable readings. Every field is absent when the
/// device produced no reading that day; absence is never encoded as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyWearableMetrics {
    pub recovery_score: Option<f64>,
    pub hrv_rmssd: Option<f64>,
    pub resting_hr: Option<f64>,
    pub spo2: Option<f64>,
    pub skin_temp: Option<f64>,
    pub sleep_performance: Option<f64>,
    pub sleep_efficiency: Option<f64>,
    pub sleep_consistency: Option<f64>,
    pub total_sleep_hours: Option<f64>,
    pub light_sleep_hours: Option<f64>,
    pub deep_sleep_hours: Option<f64>,
    pub rem_sleep_hours: Option<f64>,
    pub awake_hours: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub day_strain: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub kilojoules: Option<f64>,
}

impl DailyWearableMetrics {
    fn slot(&self, metric: WearableMetric) -> &Option<f64> {
        match metric {
            WearableMetric::RecoveryScore => &self.recovery_score,
            WearableMetric::HrvRmssd => &self.hrv_rmssd,
            WearableMetric::RestingHr => &self.resting_hr,
            WearableMetric::Spo2 => &self.spo2,
            WearableMetric::SkinTemp => &self.skin_temp,
            WearableMetric::SleepPerformance => &self.sleep_performance,
            WearableMetric::SleepEfficiency => &self.sleep_efficiency,
            WearableMetric::SleepConsistency => &self.sleep_consistency,
            WearableMetric::TotalSleepHours => &self.total_sleep_hours,
            WearableMetric::LightSleepHours => &self.light_sleep_hours,
            WearableMetric::DeepSleepHours => &self.deep_sleep_hours,
            WearableMetric::RemSleepHours => &self.rem_sleep_hours,
            WearableMetric::AwakeHours => &self.awake_hours,
            WearableMetric::RespiratoryRate => &self.respiratory_rate,
            WearableMetric::DayStrain => &self.day_strain,
            WearableMetric::AvgHr => &self.avg_hr,
            WearableMetric::MaxHr => &self.max_hr,
            WearableMetric::Kilojoules => &self.kilojoules,
        }
    }

    fn slot_mut(&mut self, metric: WearableMetric) -> &mut Option<f64> {
        match metric {
            WearableMetric::RecoveryScore => &mut self.recovery_score,
            WearableMetric::HrvRmssd => &mut self.hrv_rmssd,
            WearableMetric::RestingHr => &mut self.resting_hr,
            WearableMetric::Spo2 => &mut self.spo2,
            WearableMetric::SkinTemp => &mut self.skin_temp,
            WearableMetric::SleepPerformance => &mut self.sleep_performance,
            WearableMetric::SleepEfficiency => &mut self.sleep_efficiency,
            WearableMetric::SleepConsistency => &mut self.sleep_consistency,
            WearableMetric::TotalSleepHours => &mut self.total_sleep_hours,
            WearableMetric::LightSleepHours => &mut self.light_sleep_hours,
            WearableMetric::DeepSleepHours => &mut self.deep_sleep_hours,
            WearableMetric::RemSleepHours => &mut self.rem_sleep_hours,
            WearableMetric::AwakeHours => &mut self.awake_hours,
            WearableMetric::RespiratoryRate => &mut self.respiratory_rate,
            WearableMetric::DayStrain => &mut self.day_strain,
            WearableMetric::AvgHr => &mut self.avg_hr,
            WearableMetric::MaxHr => &mut self.max_hr,
            WearableMetric::Kilojoules => &mut self.kilojoules,
        }
    }

    pub fn get(&self, metric: WearableMetric) -> Option<f64> {
        *self.slot(metric)
    }

    /// Store a reading. Non-finite values are treated as no reading.
    pub fn set(&mut self, metric: WearableMetric, value: Option<f64>) {
        *self.slot_mut(metric) = value.filter(|v| v.is_finite());
    }

    /// Fill every absent field from `other`; fields already present are kept.
    pub fn fill_from(&mut self, other: &DailyWearableMetrics) {
        for &metric in WearableMetric::ALL {
            if self.get(metric).is_none() {
                self.set(metric, other.get(metric));
            }
        }
    }

    pub fn present_count(&self) -> usize {
        WearableMetric::ALL
            .iter()
            .filter(|m| self.get(**m).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_absent() {
        let m = DailyWearableMetrics::default();
        assert!(m.is_empty());
        for metric in WearableMetric::ALL {
            assert_eq!(m.get(*metric), None);
        }
    }

    #[test]
    fn set_and_get_every_metric() {
        let mut m = DailyWearableMetrics::default();
        for (i, metric) in WearableMetric::ALL.iter().enumerate() {
            m.set(*metric, Some(i as f64));
        }
        for (i, metric) in WearableMetric::ALL.iter().enumerate() {
            assert_eq!(m.get(*metric), Some(i as f64));
        }
        assert_eq!(m.present_count(), WearableMetric::ALL.len());
    }

    #[test]
    fn zero_is_a_reading_not_absence() {
        let mut m = DailyWearableMetrics::default();
        m.set(WearableMetric::DayStrain, Some(0.0));
        assert_eq!(m.get(WearableMetric::DayStrain), Some(0.0));
        assert!(!m.is_empty());
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let mut m = DailyWearableMetrics::default();
        m.set(WearableMetric::Spo2, Some(f64::NAN));
        assert_eq!(m.get(WearableMetric::Spo2), None);
    }

    #[test]
    fn fill_from_keeps_existing_values() {
        let mut a = DailyWearableMetrics {
            recovery_score: Some(60.0),
            ..Default::default()
        };
        let b = DailyWearableMetrics {
            recovery_score: Some(10.0),
            resting_hr: Some(52.0),
            ..Default::default()
        };
        a.fill_from(&b);
        assert_eq!(a.recovery_score, Some(60.0));
        assert_eq!(a.resting_hr, Some(52.0));
    }

    #[test]
    fn deserializes_sparse_json() {
        let m: DailyWearableMetrics =
            serde_json::from_str(r#"{"recovery_score": 71, "hrv_rmssd": 48.5}"#).unwrap();
        assert_eq!(m.recovery_score, Some(71.0));
        assert_eq!(m.hrv_rmssd, Some(48.5));
        assert_eq!(m.spo2, None);
    }
}
