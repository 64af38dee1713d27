use async_graphql::{Context, ErrorExtensions, Object, Result, ID};

use crate::{
    app_state::AppState,
    auth::extract_claims_from_context,
    models::domain::{Project, Quiz},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn project(&self, ctx: &Context<'_>, project_id: ID) -> Result<Project> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx).map_err(|e| e.extend())?;

        state
            .project_service
            .get_project(claims.user_id(), &project_id)
            .await
            .map_err(|e| e.extend())
    }

    /// The caller's projects, newest first.
    async fn projects(&self, ctx: &Context<'_>) -> Result<Vec<Project>> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx).map_err(|e| e.extend())?;

        state
            .project_service
            .list_projects(claims.user_id())
            .await
            .map_err(|e| e.extend())
    }

    async fn quiz(&self, ctx: &Context<'_>, quiz_id: ID) -> Result<Quiz> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx).map_err(|e| e.extend())?;

        state
            .quiz_service
            .get_quiz(claims.user_id(), &quiz_id)
            .await
            .map_err(|e| e.extend())
    }

    async fn project_quizzes(&self, ctx: &Context<'_>, project_id: ID) -> Result<Vec<Quiz>> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx).map_err(|e| e.extend())?;

        state
            .quiz_service
            .list_project_quizzes(claims.user_id(), &project_id)
            .await
            .map_err(|e| e.extend())
    }
}
