use actix_web::{post, web, HttpRequest, HttpResponse};

use crate::{
    app_state::AppState,
    auth::ApiKeyMiddleware,
    errors::AppError,
    middleware::get_request_id,
    models::dto::GenerateQuizzesRequest,
};

pub const QUESTIONS_REQUESTED_HEADER: &str = "x-questions-requested";
pub const QUESTIONS_GENERATED_HEADER: &str = "x-questions-generated";

#[post("/generate-quizzes", wrap = "ApiKeyMiddleware")]
async fn generate_quizzes(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<GenerateQuizzesRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    log::info!(
        "Generating {} {} questions on {:?} (request_id={})",
        request.n_questions,
        request.question_type,
        request.topic,
        get_request_id(&req).unwrap_or_default()
    );

    let outcome = state.quiz_service.generate(&request).await?;

    let mut response = HttpResponse::Ok();
    if outcome.is_partial() {
        response
            .insert_header((QUESTIONS_REQUESTED_HEADER, outcome.requested.to_string()))
            .insert_header((QUESTIONS_GENERATED_HEADER, outcome.questions.len().to_string()))
            .insert_header((
                "Warning",
                format!(
                    "199 - \"only {} of {} questions passed validation\"",
                    outcome.questions.len(),
                    outcome.requested
                ),
            ));
    }

    Ok(response.json(outcome.questions))
}
