use serde::Serialize;

use super::ValidatorConfig;
use crate::components::{Component, ComponentKind, first_of};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalCheck {
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ThermalCheck {
    fn ok() -> Self {
        Self {
            compatible: true,
            reason: None,
        }
    }

    fn fail(reason: &str) -> Self {
        Self {
            compatible: false,
            reason: Some(reason.to_string()),
        }
    }
}

// Case-insensitive substring match against any marker
fn matches_any(name: &str, markers: &[String]) -> bool {
    let name = name.to_lowercase();
    markers.iter().any(|m| name.contains(&m.to_lowercase()))
}

pub fn check(components: &[Component], config: &ValidatorConfig) -> ThermalCheck {
    let (Some(cpu), Some(cooler)) = (
        first_of(components, ComponentKind::Cpu),
        first_of(components, ComponentKind::Cooler),
    ) else {
        return ThermalCheck::ok();
    };

    let hot_cpu = cpu
        .specs
        .tdp
        .is_some_and(|tdp| tdp > config.thermal_tdp_threshold);

    if hot_cpu {
        let stock = matches_any(&cooler.name, &config.stock_cooler_markers);
        // AIOs declare a radiator, good air coolers are recognised by name
        let weak_air = cooler.specs.radiator_size.is_none()
            && !matches_any(&cooler.name, &config.high_end_air_markers);

        if stock || weak_air {
            return ThermalCheck::fail("High TDP CPU requires liquid cooling or high-end air cooler.");
        }
    }

    if let (Some(case), Some(radiator)) = (
        first_of(components, ComponentKind::Case),
        cooler.specs.radiator_size,
    ) {
        if matches_any(&case.name, &config.compact_case_markers)
            && radiator > config.compact_radiator_limit_mm
        {
            return ThermalCheck::fail("Large AIO might not fit in ITX case.");
        }
    }

    ThermalCheck::ok()
}
