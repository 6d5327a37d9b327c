use std::time::Instant;

use actix_web::error::{InternalError, JsonPayloadError, UrlencodedError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use adoption_inference::{
    encode, AnimalDescriptor, AnimalType, FeatureRow, ModelHandle, PredictionResult,
    PredictorError,
};
use log::{error, info, warn};

use crate::models::{render, ApiResponse, PredictForm, PredictionReport};
use crate::page::{render_page, Outcome};

pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default()
        .limit(4 * 1024)
        .error_handler(json_error);
    let form = web::FormConfig::default().error_handler(form_error);

    cfg.app_data(json)
        .app_data(form)
        .route("/", web::get().to(index))
        .route("/predict", web::post().to(predict_form))
        .route("/api/health", web::get().to(health_check))
        .route("/api/model-info", web::get().to(model_info))
        .route("/api/predict", web::post().to(predict_json))
        .default_service(web::route().to(not_found));
}

const INVALID_SUBMISSION: &str = "Invalid submission: please choose from the options on the form.";

fn form_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected form body: {}", err);
    let body = render_page(
        &AnimalDescriptor::default(),
        Some(Outcome::Failure(INVALID_SUBMISSION)),
    );
    let response = HttpResponse::BadRequest()
        .content_type("text/html; charset=utf-8")
        .body(body);
    InternalError::from_response(err, response).into()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected JSON body: {}", err);
    let response = HttpResponse::BadRequest()
        .json(ApiResponse::<PredictionReport>::error(&format!("Invalid request body: {err}")));
    InternalError::from_response(err, response).into()
}

fn status_for(err: &PredictorError) -> StatusCode {
    match err {
        PredictorError::ModelLoad { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PredictorError::SchemaMismatch { .. } | PredictorError::Inference(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// One encode → predict sequence, run off the async workers.
async fn run_prediction(
    model: web::Data<ModelHandle>,
    descriptor: AnimalDescriptor,
) -> Result<(FeatureRow, PredictionResult), PredictorError> {
    let row = encode(&descriptor);
    let result = web::block(move || model.predict(&row))
        .await
        .map_err(|e| PredictorError::Inference(format!("blocking execution failed: {e}")))??;
    info!(
        "Prediction: type={} adopted={} probability={:.3}",
        descriptor.animal_type.as_str(),
        result.adopted,
        result.probability
    );
    Ok((row, result))
}

async fn index() -> impl Responder {
    let initial = AnimalDescriptor {
        animal_type: AnimalType::Cat,
        ..Default::default()
    };
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_page(&initial, None))
}

async fn predict_form(
    model: web::Data<ModelHandle>,
    form: web::Form<PredictForm>,
) -> impl Responder {
    let descriptor = AnimalDescriptor::from(form.into_inner());

    let (status, body) = match run_prediction(model, descriptor).await {
        Ok((_, result)) => {
            let rendered = render(&result);
            (
                StatusCode::OK,
                render_page(&descriptor, Some(Outcome::Prediction(&rendered))),
            )
        }
        Err(e) => {
            error!("Form prediction failed: {}", e);
            (
                status_for(&e),
                render_page(&descriptor, Some(Outcome::Failure(e.user_message()))),
            )
        }
    };
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

async fn predict_json(
    model: web::Data<ModelHandle>,
    req: web::Json<AnimalDescriptor>,
) -> impl Responder {
    let start_time = Instant::now();

    match run_prediction(model, req.into_inner()).await {
        Ok((row, result)) => HttpResponse::Ok()
            .json(ApiResponse::success(PredictionReport::new(row, &result)).with_elapsed(start_time)),
        Err(e) => {
            error!("API prediction failed: {}", e);
            HttpResponse::build(status_for(&e)).json(
                ApiResponse::<PredictionReport>::error(e.user_message()).with_elapsed(start_time),
            )
        }
    }
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success("Adoption predictor is up"))
}

async fn model_info(model: web::Data<ModelHandle>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(model.model_info()))
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ApiResponse::<String>::error("Endpoint not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn forest_json() -> String {
        json!({
            "feature_names": FeatureRow::COLUMNS,
            "n_classes": 2,
            "trees": [{
                "feature": [1, -2, -2],
                "threshold": [0.5, -2.0, -2.0],
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "value": [[50.0, 50.0], [41.0, 9.0], [9.0, 41.0]]
            }]
        })
        .to_string()
    }

    fn handle_in(dir: &tempfile::TempDir, artifact: Option<String>) -> web::Data<ModelHandle> {
        let path = dir.path().join("rf_model.json");
        if let Some(body) = artifact {
            std::fs::write(&path, body).unwrap();
        }
        web::Data::new(ModelHandle::new(path, 0.5))
    }

    macro_rules! app {
        ($model:expr) => {
            test::init_service(App::new().app_data($model).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn index_serves_form() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, None));
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Will It Be Adopted?"));
        assert!(body.contains(r#"value="Cat" checked"#));
    }

    #[actix_web::test]
    async fn form_submission_reports_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, Some(forest_json())));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("animal_type", "Dog"), ("fixed", "on")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("The animal is predicted to be adopted!"));
        assert!(body.contains("Predicted probability of adoption: 82.00 %"));
        assert!(body.contains(r#"name="fixed" checked"#));
    }

    #[actix_web::test]
    async fn form_submission_not_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, Some(forest_json())));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("animal_type", "Cat")])
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("The animal is not predicted to be adopted"));
        assert!(body.contains("18.00 %"));
    }

    #[actix_web::test]
    async fn missing_model_shows_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, None));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("animal_type", "Cat")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Prediction unavailable"));
        assert!(body.contains("Click to Predict"));
    }

    #[actix_web::test]
    async fn unknown_animal_type_in_form_shows_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, Some(forest_json())));
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form([("animal_type", "Horse")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Invalid submission"));
        assert!(body.contains("Click to Predict"));
    }

    #[actix_web::test]
    async fn unknown_animal_type_in_json_is_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, Some(forest_json())));
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(json!({"animal_type": "Horse"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[actix_web::test]
    async fn json_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, Some(forest_json())));
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(json!({"animal_type": "Cat", "fixed": true, "color_black": true}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        let data = &body["data"];
        assert_eq!(data["adopted"], true);
        assert_eq!(data["feature_row"]["Type_Cat"], true);
        assert_eq!(data["feature_row"]["Type_Dog"], false);
        assert_eq!(data["feature_row"]["Color_black"], true);
        assert_eq!(data["headline"], "The animal is predicted to be adopted!");
        assert_eq!(data["detail"], "Predicted probability of adoption: 82.00 %");
    }

    #[actix_web::test]
    async fn schema_mismatch_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let renamed = forest_json().replace("\"Young\"", "\"Age\"");
        let app = app!(handle_in(&dir, Some(renamed)));
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(json!({"animal_type": "Other"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Internal error"));
    }

    #[actix_web::test]
    async fn model_info_before_first_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, Some(forest_json())));
        let req = test::TestRequest::get().uri("/api/model-info").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["loaded"], false);
        assert_eq!(body["data"]["format"], "json");
        assert_eq!(body["data"]["n_features"], 7);
    }

    #[actix_web::test]
    async fn unknown_route_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, None));
        let req = test::TestRequest::get().uri("/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn health() {
        let dir = tempfile::tempdir().unwrap();
        let app = app!(handle_in(&dir, None));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }
}
