// src/category.rs
//! Product category derived from the stock name (the source sheets carry no category column).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
pub enum Category {
    #[strum(serialize = "Eye Massager")]
    #[serde(rename = "Eye Massager")]
    EyeMassager,
    #[strum(serialize = "Neck/Cervical")]
    #[serde(rename = "Neck/Cervical")]
    NeckCervical,
    #[strum(serialize = "Waist Massager")]
    #[serde(rename = "Waist Massager")]
    WaistMassager,
    #[strum(serialize = "Knee Massager")]
    #[serde(rename = "Knee Massager")]
    KneeMassager,
    #[strum(serialize = "Massage Gun")]
    #[serde(rename = "Massage Gun")]
    MassageGun,
    #[strum(serialize = "Body Massager")]
    #[serde(rename = "Body Massager")]
    BodyMassager,
    Others,
}

/// Keyword rules, checked in order. First match wins.
const RULES: &[(&[&str], Category)] = &[
    (&["eye"], Category::EyeMassager),
    (&["neck", "cervical"], Category::NeckCervical),
    (&["waist"], Category::WaistMassager),
    (&["knee"], Category::KneeMassager),
    (&["gun", "fascia"], Category::MassageGun),
    (&["body"], Category::BodyMassager),
];

impl Category {
    pub fn from_stock_name(stock_name: &str) -> Self {
        let name = stock_name.to_lowercase();
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
            .map(|(_, category)| *category)
            .unwrap_or(Category::Others)
    }
}
