//! Post-hoc compatibility checks for a proposed parts list.
//!
//! Every check is a pure function of the component slice: running them twice,
//! in any order or in parallel, gives the same result. An incompatible build
//! is a normal result value, never an error.

mod bottleneck;
mod power;
mod thermal;
pub mod tiers;

use serde::Serialize;

use crate::components::Component;

pub use bottleneck::BottleneckCheck;
pub use power::PowerCheck;
pub use thermal::ThermalCheck;
pub use tiers::TierTable;

/// Tunables for the power and thermal heuristics.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Added to summed TDP for motherboard, fans and drives.
    pub power_headroom_watts: u32,
    pub safety_factor: f64,
    /// Used instead of `safety_factor` for GPUs with large transient spikes.
    pub transient_safety_factor: f64,
    pub transient_gpu_markers: Vec<String>,
    pub wattage_rounding: u32,
    pub thermal_tdp_threshold: u32,
    pub stock_cooler_markers: Vec<String>,
    pub high_end_air_markers: Vec<String>,
    pub compact_case_markers: Vec<String>,
    pub compact_radiator_limit_mm: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            power_headroom_watts: 100,
            safety_factor: 1.2,
            transient_safety_factor: 1.3,
            transient_gpu_markers: vec!["4090".into(), "4080".into()],
            wattage_rounding: 50,
            thermal_tdp_threshold: 120,
            stock_cooler_markers: vec!["stock".into()],
            high_end_air_markers: vec!["noctua".into(), "assassin".into()],
            compact_case_markers: vec!["itx".into()],
            compact_radiator_limit_mm: 240,
        }
    }
}

/// Results of all three checks for one parts list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub power: PowerCheck,
    pub thermal: ThermalCheck,
    pub bottleneck: BottleneckCheck,
}

impl BuildReport {
    pub fn is_compatible(&self) -> bool {
        self.power.compatible && self.thermal.compatible && self.bottleneck.compatible
    }
}

/// Price and power roll-up shown next to a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub total_price: f64,
    pub power_usage: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    pub budget_usage_percent: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BuildValidator {
    config: ValidatorConfig,
    tiers: TierTable,
}

impl BuildValidator {
    pub fn new(config: ValidatorConfig, tiers: TierTable) -> Self {
        Self { config, tiers }
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn total_power(&self, components: &[Component]) -> u64 {
        power::total_power(components, &self.config)
    }

    pub fn check_power(&self, components: &[Component]) -> PowerCheck {
        power::check(components, &self.config)
    }

    pub fn check_thermal(&self, components: &[Component]) -> ThermalCheck {
        thermal::check(components, &self.config)
    }

    pub fn check_bottleneck(&self, components: &[Component]) -> BottleneckCheck {
        bottleneck::check(components, &self.tiers)
    }

    pub fn validate(&self, components: &[Component]) -> BuildReport {
        BuildReport {
            power: self.check_power(components),
            thermal: self.check_thermal(components),
            bottleneck: self.check_bottleneck(components),
        }
    }

    pub fn summarize(&self, components: &[Component], budget: Option<f64>) -> BuildSummary {
        let total_price: f64 = components.iter().map(|c| c.price).sum();
        let budget_usage_percent = match budget {
            Some(b) if b > 0.0 => total_price / b * 100.0,
            _ => 0.0,
        };

        BuildSummary {
            total_price,
            power_usage: self.total_power(components),
            budget,
            budget_usage_percent,
            over_budget: budget_usage_percent > 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;

    fn flagship_on_weak_psu() -> Vec<Component> {
        vec![
            Component::new(ComponentKind::Cpu, "i3-12100").with_tdp(60).with_price(120.0),
            Component::new(ComponentKind::Gpu, "RTX 4090").with_tdp(450).with_price(1599.0),
            Component::new(ComponentKind::Psu, "Generic 550W").with_wattage(550).with_price(45.0),
            Component::new(ComponentKind::Cooler, "Stock Cooler"),
        ]
    }

    #[test]
    fn validate_reports_each_check() {
        let validator = BuildValidator::default();
        let report = validator.validate(&flagship_on_weak_psu());

        assert!(!report.power.compatible);
        assert_eq!(report.power.recommended_wattage, 800);
        // 60W CPU is under the thermal threshold
        assert!(report.thermal.compatible);
        assert!(!report.bottleneck.compatible);
        assert!(!report.is_compatible());
    }

    #[test]
    fn checks_are_idempotent() {
        let validator = BuildValidator::default();
        let parts = flagship_on_weak_psu();
        let before = parts.clone();

        assert_eq!(validator.validate(&parts), validator.validate(&parts));
        assert_eq!(parts, before);
    }

    #[test]
    fn report_serializes_with_wire_names() {
        let json = serde_json::to_value(BuildValidator::default().validate(&flagship_on_weak_psu())).unwrap();
        assert_eq!(json["power"]["recommendedWattage"], 800);
        assert_eq!(json["bottleneck"]["bottleneckScore"], 30);
        assert!(json["thermal"].get("reason").is_none());
    }

    #[test]
    fn summary_tracks_budget() {
        let validator = BuildValidator::default();
        let parts = flagship_on_weak_psu();

        let summary = validator.summarize(&parts, Some(1500.0));
        assert_eq!(summary.total_price, 1764.0);
        assert_eq!(summary.power_usage, 610);
        assert!(summary.over_budget);

        let no_budget = validator.summarize(&parts, None);
        assert_eq!(no_budget.budget_usage_percent, 0.0);
        assert!(!no_budget.over_budget);

        let zero_budget = validator.summarize(&parts, Some(0.0));
        assert!(!zero_budget.over_budget);
    }

    #[test]
    fn summary_power_survives_huge_tdp() {
        let parts = vec![
            Component::new(ComponentKind::Cpu, "i9").with_tdp(u32::MAX),
            Component::new(ComponentKind::Gpu, "RTX 4090").with_tdp(u32::MAX),
        ];
        let summary = BuildValidator::default().summarize(&parts, None);
        assert_eq!(summary.power_usage, 2 * u64::from(u32::MAX) + 100);
    }
}
