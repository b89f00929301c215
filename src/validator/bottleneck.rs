use serde::Serialize;

use super::TierTable;
use crate::components::{Component, ComponentKind, first_of};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckCheck {
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub bottleneck_score: u32,
}

pub fn check(components: &[Component], tiers: &TierTable) -> BottleneckCheck {
    let (Some(cpu), Some(gpu)) = (
        first_of(components, ComponentKind::Cpu),
        first_of(components, ComponentKind::Gpu),
    ) else {
        return BottleneckCheck {
            compatible: true,
            reason: None,
            bottleneck_score: 0,
        };
    };

    let diff = i32::from(tiers.gpu_tier(&gpu.name)) - i32::from(tiers.cpu_tier(&cpu.name));

    if diff > 1 {
        BottleneckCheck {
            compatible: false,
            reason: Some("CPU is too weak for this GPU (Bottleneck risk)".to_string()),
            bottleneck_score: diff.unsigned_abs() * 10,
        }
    } else if diff < -2 {
        // wasted CPU headroom, still a working build
        BottleneckCheck {
            compatible: true,
            reason: Some("GPU is significantly weaker than CPU".to_string()),
            bottleneck_score: diff.unsigned_abs() * 5,
        }
    } else {
        BottleneckCheck {
            compatible: true,
            reason: None,
            bottleneck_score: 0,
        }
    }
}
