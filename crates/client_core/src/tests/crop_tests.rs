use super::*;

use async_trait::async_trait;
use shared::crop::CropDetails;
use tokio::sync::Mutex;

use crate::transport::Endpoint;

#[derive(Default)]
struct ScriptedCropService {
    requests: Mutex<Vec<CropPlanRequest>>,
    fail_with_status: Option<u16>,
}

#[async_trait]
impl CropPlanService for ScriptedCropService {
    async fn recommend_crop(
        &self,
        request: &CropPlanRequest,
    ) -> Result<CropPlanResponse, ServiceError> {
        self.requests.lock().await.push(request.clone());
        if let Some(status) = self.fail_with_status {
            return Err(ServiceError::Status {
                endpoint: Endpoint::RecommendCrop,
                status,
                body: "No suitable crop found based on the provided conditions.".into(),
            });
        }
        Ok(CropPlanResponse {
            message: "Crop recommendation and plan generated successfully!".into(),
            recommended_crop_details: CropDetails {
                crop_name: Some("Wheat".into()),
                ..CropDetails::default()
            },
            suitability_score: Some(80.0),
            crop_plan_report: "# Your Crop Plan for Wheat".into(),
        })
    }
}

fn filled_form() -> CropPlanForm {
    let mut form = CropPlanForm::new(UiLanguage::Hindi);
    form.set_soil_type(Some(SoilType::Loamy));
    form.set_position(28.61, 77.2);
    form
}

#[test]
fn new_form_starts_neutral() {
    let form = CropPlanForm::new(UiLanguage::Tamil);
    assert_eq!(form.soil_ph(), DEFAULT_SOIL_PH);
    assert_eq!(form.position(), (0.0, 0.0));
    assert_eq!(form.language(), UiLanguage::Tamil);
}

#[test]
fn soil_ph_is_clamped_and_stepped() {
    let mut form = CropPlanForm::new(UiLanguage::English);

    form.set_soil_ph(6.46);
    assert_eq!(form.soil_ph(), 6.5);
    form.set_soil_ph(15.2);
    assert_eq!(form.soil_ph(), 14.0);
    form.set_soil_ph(-1.0);
    assert_eq!(form.soil_ph(), 0.0);
    form.set_soil_ph(f64::NAN);
    assert_eq!(form.soil_ph(), 0.0);
}

#[test]
fn missing_soil_type_is_rejected() {
    let form = CropPlanForm::new(UiLanguage::English);
    assert_eq!(form.to_request(), Err(CropFormError::MissingSoilType));
}

#[test]
fn coordinates_out_of_range_are_rejected() {
    let mut form = filled_form();
    form.set_position(91.0, 77.2);
    assert_eq!(form.to_request(), Err(CropFormError::InvalidLatitude(91.0)));

    form.set_position(28.61, -181.0);
    assert_eq!(form.to_request(), Err(CropFormError::InvalidLongitude(-181.0)));
}

#[test]
fn request_carries_selections_and_drops_blank_text() {
    let mut form = filled_form();
    form.set_soil_salinity(Some(SoilSalinity::Medium));
    form.set_topography(Some(LandTopography::Sloped));
    form.set_land_area(Some(12));
    form.set_budget(Some(BudgetRange::Low));
    form.set_irrigation(Some(IrrigationMethod::Drip));
    form.set_labor("  ");
    form.set_fertilizer(" urea ");
    form.set_language(UiLanguage::Marathi);

    let request = form.to_request().expect("request");
    assert_eq!(request.soil_type, SoilType::Loamy);
    assert_eq!(request.soil_ph, DEFAULT_SOIL_PH);
    assert_eq!(request.soil_salinity, Some(SoilSalinity::Medium));
    assert_eq!(request.topography, Some(LandTopography::Sloped));
    assert_eq!(request.land_area.as_deref(), Some("12"));
    assert_eq!(request.budget, Some(BudgetRange::Low));
    assert_eq!(request.irrigation, Some(IrrigationMethod::Drip));
    assert_eq!(request.labor, None);
    assert_eq!(request.fertilizer.as_deref(), Some("urea"));
    assert_eq!(request.pest_disease, None);
    assert_eq!((request.lat, request.lon), (28.61, 77.2));
    assert_eq!(request.language, UiLanguage::Marathi);
}

#[tokio::test]
async fn plan_crop_sends_the_validated_request() {
    let service = ScriptedCropService::default();

    let response = plan_crop(&service, &filled_form()).await.expect("plan");

    assert_eq!(
        response.recommended_crop_details.crop_name.as_deref(),
        Some("Wheat")
    );
    let requests = service.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].language, UiLanguage::Hindi);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_backend() {
    let service = ScriptedCropService::default();

    let err = plan_crop(&service, &CropPlanForm::new(UiLanguage::English))
        .await
        .expect_err("invalid form");

    assert!(matches!(err, CropPlanError::Form(CropFormError::MissingSoilType)));
    assert!(service.requests.lock().await.is_empty());
}

#[tokio::test]
async fn backend_failure_is_passed_through() {
    let service = ScriptedCropService {
        fail_with_status: Some(404),
        ..ScriptedCropService::default()
    };

    let err = plan_crop(&service, &filled_form()).await.expect_err("404");

    match err {
        CropPlanError::Service(ServiceError::Status { endpoint, status, .. }) => {
            assert_eq!(endpoint, Endpoint::RecommendCrop);
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
