use async_graphql::Context;

use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
};

pub fn require_owner(caller: &str, resource_owner: &str) -> AppResult<()> {
    if caller != resource_owner {
        return Err(AppError::Forbidden(
            "You can only access your own projects".to_string(),
        ));
    }
    Ok(())
}

/// Claims attached to the GraphQL request, if the caller sent a valid token.
pub fn maybe_claims_from_context(ctx: &Context<'_>) -> Option<Claims> {
    ctx.data_opt::<Claims>().cloned()
}

pub fn extract_claims_from_context(ctx: &Context<'_>) -> AppResult<Claims> {
    maybe_claims_from_context(ctx).ok_or(AppError::Unauthenticated)
}
