use shared::{
    crop::{
        BudgetRange, CropPlanRequest, CropPlanResponse, IrrigationMethod, LandTopography,
        SoilSalinity, SoilType,
    },
    domain::UiLanguage,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::transport::{CropPlanService, ServiceError};

pub const DEFAULT_SOIL_PH: f64 = 7.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropFormError {
    #[error("soil type is required")]
    MissingSoilType,
    #[error("latitude {0} is outside -90..=90")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    InvalidLongitude(f64),
}

#[derive(Debug, Error)]
pub enum CropPlanError {
    #[error(transparent)]
    Form(#[from] CropFormError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropPlanForm {
    soil_type: Option<SoilType>,
    soil_ph: f64,
    soil_salinity: Option<SoilSalinity>,
    topography: Option<LandTopography>,
    land_area: Option<u32>,
    budget: Option<BudgetRange>,
    labor: String,
    irrigation: Option<IrrigationMethod>,
    fertilizer: String,
    pest_disease: String,
    lat: f64,
    lon: f64,
    language: UiLanguage,
}

impl CropPlanForm {
    pub fn new(language: UiLanguage) -> Self {
        Self {
            soil_type: None,
            soil_ph: DEFAULT_SOIL_PH,
            soil_salinity: None,
            topography: None,
            land_area: None,
            budget: None,
            labor: String::new(),
            irrigation: None,
            fertilizer: String::new(),
            pest_disease: String::new(),
            lat: 0.0,
            lon: 0.0,
            language,
        }
    }

    pub fn soil_ph(&self) -> f64 {
        self.soil_ph
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    pub fn language(&self) -> UiLanguage {
        self.language
    }

    pub fn set_soil_type(&mut self, soil_type: Option<SoilType>) {
        self.soil_type = soil_type;
    }

    /// Clamped to 0..=14 and rounded to one decimal. Non-finite input is ignored.
    pub fn set_soil_ph(&mut self, ph: f64) {
        if !ph.is_finite() {
            return;
        }
        self.soil_ph = (ph.clamp(0.0, 14.0) * 10.0).round() / 10.0;
    }

    pub fn set_soil_salinity(&mut self, salinity: Option<SoilSalinity>) {
        self.soil_salinity = salinity;
    }

    pub fn set_topography(&mut self, topography: Option<LandTopography>) {
        self.topography = topography;
    }

    pub fn set_land_area(&mut self, area: Option<u32>) {
        self.land_area = area;
    }

    pub fn set_budget(&mut self, budget: Option<BudgetRange>) {
        self.budget = budget;
    }

    pub fn set_labor(&mut self, labor: impl Into<String>) {
        self.labor = labor.into();
    }

    pub fn set_irrigation(&mut self, irrigation: Option<IrrigationMethod>) {
        self.irrigation = irrigation;
    }

    pub fn set_fertilizer(&mut self, fertilizer: impl Into<String>) {
        self.fertilizer = fertilizer.into();
    }

    pub fn set_pest_disease(&mut self, pest_disease: impl Into<String>) {
        self.pest_disease = pest_disease.into();
    }

    pub fn set_position(&mut self, lat: f64, lon: f64) {
        self.lat = lat;
        self.lon = lon;
    }

    pub fn set_language(&mut self, language: UiLanguage) {
        self.language = language;
    }

    pub fn to_request(&self) -> Result<CropPlanRequest, CropFormError> {
        let soil_type = self.soil_type.ok_or(CropFormError::MissingSoilType)?;
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CropFormError::InvalidLatitude(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(CropFormError::InvalidLongitude(self.lon));
        }

        Ok(CropPlanRequest {
            soil_type,
            soil_ph: self.soil_ph,
            soil_salinity: self.soil_salinity,
            topography: self.topography,
            land_area: self.land_area.map(|area| area.to_string()),
            budget: self.budget,
            labor: non_blank(&self.labor),
            irrigation: self.irrigation,
            fertilizer: non_blank(&self.fertilizer),
            pest_disease: non_blank(&self.pest_disease),
            lat: self.lat,
            lon: self.lon,
            language: self.language,
        })
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validates `form` and asks the backend for a crop plan. Invalid forms are
/// rejected before anything is sent.
pub async fn plan_crop(
    service: &dyn CropPlanService,
    form: &CropPlanForm,
) -> Result<CropPlanResponse, CropPlanError> {
    let request = form.to_request()?;
    info!(soil = ?request.soil_type, ph = request.soil_ph, "requesting crop plan");

    match service.recommend_crop(&request).await {
        Ok(response) => {
            info!(
                crop = response.recommended_crop_details.crop_name.as_deref().unwrap_or("-"),
                score = ?response.suitability_score,
                "crop plan received"
            );
            Ok(response)
        }
        Err(err) => {
            warn!(error = %err, "crop plan request failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
#[path = "tests/crop_tests.rs"]
mod tests;
