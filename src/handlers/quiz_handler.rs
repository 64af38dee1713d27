use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{AuthenticatedUser, MaybeAuthenticated},
    errors::AppError,
    models::{
        domain::QuizConfig,
        dto::{
            request::{GenerateQuizBody, GenerateQuizRequest, SubmitQuizResultRequest},
            response::GenerateQuizResponse,
        },
    },
};

async fn run_generation(
    state: &AppState,
    auth: MaybeAuthenticated,
    project_id: String,
    config: QuizConfig,
) -> Result<HttpResponse, AppError> {
    let quiz_id = state
        .quiz_generation_service
        .clone()
        .generate_quiz_detached(
            auth.user_id().map(str::to_string),
            project_id,
            config,
            state.config.request_timeout(),
        )
        .await?;
    Ok(HttpResponse::Created().json(GenerateQuizResponse { quiz_id }))
}

/// `{ projectId, config }` in, `{ quizId }` out.
#[post("/api/generateQuiz")]
async fn generate_quiz(
    state: web::Data<AppState>,
    request: web::Json<GenerateQuizRequest>,
    auth: MaybeAuthenticated,
) -> Result<HttpResponse, AppError> {
    let GenerateQuizRequest { project_id, config } = request.into_inner();
    run_generation(&state, auth, project_id, config).await
}

#[post("/api/projects/{project_id}/quizzes")]
async fn generate_project_quiz(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    request: web::Json<GenerateQuizBody>,
    auth: MaybeAuthenticated,
) -> Result<HttpResponse, AppError> {
    run_generation(&state, auth, project_id.into_inner(), request.into_inner().config).await
}

#[get("/api/projects/{project_id}/quizzes")]
async fn list_project_quizzes(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state
        .quiz_service
        .list_project_quizzes(auth.user_id(), &project_id)
        .await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[get("/api/quizzes/{quiz_id}")]
async fn get_quiz(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(auth.user_id(), &quiz_id).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[post("/api/quizzes/{quiz_id}/results")]
async fn submit_quiz_result(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    request: web::Json<SubmitQuizResultRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .quiz_service
        .submit_result(auth.user_id(), &quiz_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}
