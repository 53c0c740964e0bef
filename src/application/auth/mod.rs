//! Authentication: tokens, API keys and request attribution.

pub mod api_keys;
pub mod platform;
pub mod principal;
pub mod routes;
pub mod token;

pub use api_keys::{ApiKeyService, IssuedApiKey};
pub use platform::PlatformResolver;
pub use principal::{PrincipalResolver, RequestCredentials, ResolvedCaller};
pub use routes::RoutePolicy;
pub use token::TokenService;
