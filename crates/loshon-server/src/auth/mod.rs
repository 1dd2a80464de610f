mod jwt;
mod middleware;

pub use jwt::{create_access_token, verify_access_token, Claims};
pub use middleware::{auth_middleware, optional_auth_middleware, AuthUser};
