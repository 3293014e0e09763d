/// Settings read once at startup and managed by Rocket. All values come
/// from environment variables (or a `.env` file), with defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mongodb_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let jwt_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "change_me".to_string());

        AppConfig {
            mongodb_uri,
            jwt_secret,
        }
    }
}
