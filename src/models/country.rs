use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryName {
    pub common: String,
    pub official: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFlags {
    pub png: String,
    pub svg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: CountryName,
    pub flags: CountryFlags,
}

impl Country {
    pub fn matches_prefix(&self, lowered_term: &str) -> bool {
        self.name.common.to_lowercase().starts_with(lowered_term)
            || self.name.official.to_lowercase().starts_with(lowered_term)
    }
}
