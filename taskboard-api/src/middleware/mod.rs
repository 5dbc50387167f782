/// Middleware modules for the API server
///
/// - `auth`: bearer token authentication for the protected routes

pub mod auth;
