use faststr::FastStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name:      FastStr,
    #[serde(default)]
    pub enabled:   bool,
    #[serde(default)]
    pub providers: Vec<FastStr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetList {
    #[serde(default)]
    pub items: Vec<Preset>,
}

impl PresetList {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|p| p.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
