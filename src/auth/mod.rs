pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod utils;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser, MaybeAuthenticated};
pub use utils::{extract_claims_from_context, maybe_claims_from_context, require_owner};
