use async_graphql::{Context, ErrorExtensions, Object, Result, ID};

use crate::{
    app_state::AppState,
    auth::{extract_claims_from_context, maybe_claims_from_context},
    models::{
        domain::{Project, QuizConfig, QuizResult},
        dto::{
            request::{CreateProjectRequest, SubmitQuizResultRequest},
            response::GenerateQuizResponse,
        },
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_project(
        &self,
        ctx: &Context<'_>,
        input: CreateProjectRequest,
    ) -> Result<Project> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx).map_err(|e| e.extend())?;

        state
            .project_service
            .create_project(claims.user_id(), input)
            .await
            .map_err(|e| e.extend())
    }

    /// Anonymous callers reach the service so it reports `UNAUTHENTICATED`
    /// the same way the REST route does.
    async fn generate_quiz(
        &self,
        ctx: &Context<'_>,
        project_id: ID,
        config: QuizConfig,
    ) -> Result<GenerateQuizResponse> {
        let state = ctx.data::<AppState>()?;
        let caller = maybe_claims_from_context(ctx).map(|claims| claims.sub);

        let quiz_id = state
            .quiz_generation_service
            .clone()
            .generate_quiz_detached(
                caller,
                project_id.to_string(),
                config,
                state.config.request_timeout(),
            )
            .await
            .map_err(|e| e.extend())?;

        Ok(GenerateQuizResponse { quiz_id })
    }

    async fn submit_quiz_result(
        &self,
        ctx: &Context<'_>,
        quiz_id: ID,
        input: SubmitQuizResultRequest,
    ) -> Result<QuizResult> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx).map_err(|e| e.extend())?;

        state
            .quiz_service
            .submit_result(claims.user_id(), &quiz_id, input)
            .await
            .map_err(|e| e.extend())
    }
}
