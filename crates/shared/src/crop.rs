use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::UiLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    #[serde(rename = "Loamy soil")]
    Loamy,
    #[serde(rename = "Sandy soil")]
    Sandy,
    #[serde(rename = "Clay soil")]
    Clay,
    #[serde(rename = "Silty soil")]
    Silty,
}

/// Electrical conductivity band, in dS/m.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilSalinity {
    #[serde(rename = "Low (0-0.8 ds/m)")]
    Low,
    #[serde(rename = "Medium (0.8-1.2 ds/m)")]
    Medium,
    #[serde(rename = "High (>2.0 ds/m)")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandTopography {
    Flat,
    Sloped,
    Undulating,
    Terraced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetRange {
    #[serde(rename = "Low (₹0 - ₹50,000)")]
    Low,
    #[serde(rename = "Medium (₹50,001 - ₹2,00,000)")]
    Medium,
    #[serde(rename = "High (>₹2,00,000)")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrrigationMethod {
    Flood,
    Drip,
    Sprinkler,
    Canal,
    Well,
    Rainfed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPlanRequest {
    #[serde(rename = "soilType")]
    pub soil_type: SoilType,
    #[serde(rename = "soilPH")]
    pub soil_ph: f64,
    #[serde(rename = "soilEC", default, skip_serializing_if = "Option::is_none")]
    pub soil_salinity: Option<SoilSalinity>,
    #[serde(rename = "landTopo", default, skip_serializing_if = "Option::is_none")]
    pub topography: Option<LandTopography>,
    #[serde(rename = "landArea", default, skip_serializing_if = "Option::is_none")]
    pub land_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation: Option<IrrigationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertilizer: Option<String>,
    #[serde(rename = "pestDisease", default, skip_serializing_if = "Option::is_none")]
    pub pest_disease: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub language: UiLanguage,
}

/// The crop record the backend picked. Only the name is interpreted; ranges
/// and growing notes are kept as delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CropDetails {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropPlanResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommended_crop_details: CropDetails,
    #[serde(default)]
    pub suitability_score: Option<f64>,
    #[serde(default)]
    pub crop_plan_report: String,
}
