use serde::Serialize;

use super::ValidatorConfig;
use crate::components::{Component, ComponentKind, first_of};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerCheck {
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub recommended_wattage: u64,
}

// Declared TDP of every part plus fixed headroom
// Summed in u64 so any number of u32 TDPs fits
pub fn total_power(components: &[Component], config: &ValidatorConfig) -> u64 {
    let declared: u64 = components
        .iter()
        .filter_map(|c| c.specs.tdp)
        .map(u64::from)
        .sum();
    declared.saturating_add(u64::from(config.power_headroom_watts))
}

fn safety_factor(components: &[Component], config: &ValidatorConfig) -> f64 {
    let spiky = first_of(components, ComponentKind::Gpu).is_some_and(|gpu| {
        config
            .transient_gpu_markers
            .iter()
            .any(|m| gpu.name.contains(m.as_str()))
    });

    if spiky {
        config.transient_safety_factor
    } else {
        config.safety_factor
    }
}

pub fn recommended_wattage(components: &[Component], config: &ValidatorConfig) -> u64 {
    let total = total_power(components, config) as f64;
    let step = config.wattage_rounding.max(1) as f64;
    // always round up to the next step
    ((total * safety_factor(components, config) / step).ceil() * step) as u64
}

pub fn check(components: &[Component], config: &ValidatorConfig) -> PowerCheck {
    let total = total_power(components, config);
    let recommended_wattage = recommended_wattage(components, config);

    let fail = |reason: String| PowerCheck {
        compatible: false,
        reason: Some(reason),
        recommended_wattage,
    };

    let Some(psu) = first_of(components, ComponentKind::Psu) else {
        return fail("No PSU found".to_string());
    };
    let Some(wattage) = psu.specs.wattage else {
        return fail("PSU wattage unknown".to_string());
    };

    if u64::from(wattage) < recommended_wattage {
        return fail(format!(
            "PSU wattage {}W is too low. Recommended: {}W (Total TDP: {}W)",
            wattage, recommended_wattage, total
        ));
    }

    PowerCheck {
        compatible: true,
        reason: None,
        recommended_wattage,
    }
}
