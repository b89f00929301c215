use serde::{Deserialize, Serialize};

// Part categories a build can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
    #[serde(rename = "RAM")]
    Ram,
    Motherboard,
    #[serde(rename = "PSU")]
    Psu,
    Storage,
    Cooler,
    Case,
}

// Sparse, type-dependent specs. None = unknown, Some(0) = known zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdp: Option<u32>, // watts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vram: Option<u32>, // GB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>, // mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<f64>, // GHz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<String>, // 80+ Gold etc
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wattage: Option<u32>, // PSU only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_flow: Option<f64>, // CFM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radiator_size: Option<u32>, // mm
}

// One selected hardware part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub specs: ComponentSpecs,
}

#[cfg(test)]
impl Component {
    pub fn new(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            price: 0.0,
            specs: ComponentSpecs::default(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_tdp(mut self, tdp: u32) -> Self {
        self.specs.tdp = Some(tdp);
        self
    }

    pub fn with_wattage(mut self, wattage: u32) -> Self {
        self.specs.wattage = Some(wattage);
        self
    }

    pub fn with_radiator(mut self, size_mm: u32) -> Self {
        self.specs.radiator_size = Some(size_mm);
        self
    }
}

// First component of the given kind wins when duplicates exist
pub fn first_of(components: &[Component], kind: ComponentKind) -> Option<&Component> {
    components.iter().find(|c| c.kind == kind)
}
