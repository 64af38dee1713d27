pub mod health_handler;
pub mod project_handler;
pub mod quiz_handler;

use actix_web::web;

pub use health_handler::{health_check, health_check_live, health_check_ready};
pub use project_handler::{create_project, get_project, list_projects, upload_knowledge};
pub use quiz_handler::{
    generate_project_quiz, generate_quiz, get_quiz, list_project_quizzes, submit_quiz_result,
};

use crate::{errors::AppError, graphql};

/// Registers every REST route plus the GraphQL endpoint. Expects
/// `web::Data<AppState>` and `web::Data<graphql::Schema>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .service(health_check)
    .service(health_check_ready)
    .service(health_check_live)
    .service(create_project)
    .service(list_projects)
    .service(get_project)
    .service(upload_knowledge)
    .service(generate_quiz)
    .service(generate_project_quiz)
    .service(list_project_quizzes)
    .service(get_quiz)
    .service(submit_quiz_result)
    .service(
        web::resource("/graphql")
            .route(web::post().to(graphql::graphql_handler))
            .route(web::get().to(graphql::graphiql)),
    );
}
