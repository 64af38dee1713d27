use actix_web::{get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{CreateProjectRequest, UploadKnowledgeQuery},
};

#[post("/api/projects")]
async fn create_project(
    state: web::Data<AppState>,
    request: web::Json<CreateProjectRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let project = state
        .project_service
        .create_project(auth.user_id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(project))
}

#[get("/api/projects")]
async fn list_projects(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let projects = state.project_service.list_projects(auth.user_id()).await?;
    Ok(HttpResponse::Ok().json(projects))
}

#[get("/api/projects/{project_id}")]
async fn get_project(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let project = state
        .project_service
        .get_project(auth.user_id(), &project_id)
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Raw document bytes in the body; the original file name in `?fileName=`.
#[put("/api/projects/{project_id}/knowledge")]
async fn upload_knowledge(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    query: web::Query<UploadKnowledgeQuery>,
    body: web::Bytes,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .project_service
        .upload_knowledge(auth.user_id(), &project_id, &query.file_name, body.to_vec())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
