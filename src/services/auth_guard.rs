use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

use crate::config::app_config::AppConfig;
use crate::jwt::jwt_helper;

/// Request guard for routes that require a verified caller. Reads the
/// `Authorization: Bearer <token>` header and verifies the token against
/// the configured secret; the guard failing turns into a 401 response.
pub struct AuthenticatedUser {
    pub email: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match request.rocket().state::<AppConfig>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, ())),
        };

        let authorization = match request.headers().get_one("Authorization") {
            Some(value) => value,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let token = match authorization.strip_prefix("Bearer ") {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        match jwt_helper::verify_token(token, config.jwt_secret.as_bytes()) {
            Ok(claims) => Outcome::Success(AuthenticatedUser { email: claims.sub }),
            Err(_) => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Header;
    use rocket::local::blocking::Client;
    use rocket::{get, routes, Build, Rocket};

    #[get("/whoami")]
    fn whoami(auth: AuthenticatedUser) -> String {
        auth.email
    }

    fn test_rocket() -> Rocket<Build> {
        let config = AppConfig {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            jwt_secret: "guard_test_secret".to_string(),
        };
        rocket::build().manage(config).mount("/", routes![whoami])
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let client = Client::tracked(test_rocket()).unwrap();
        let response = client.get("/whoami").dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[test]
    fn valid_bearer_token_yields_verified_email() {
        let client = Client::tracked(test_rocket()).unwrap();
        let token =
            jwt_helper::create_token("buyer@example.com", b"guard_test_secret").unwrap();

        let response = client
            .get("/whoami")
            .header(Header::new("Authorization", format!("Bearer {}", token)))
            .dispatch();

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().unwrap(), "buyer@example.com");
    }

    #[test]
    fn non_bearer_scheme_is_unauthorized() {
        let client = Client::tracked(test_rocket()).unwrap();
        let response = client
            .get("/whoami")
            .header(Header::new("Authorization", "Basic dXNlcjpwYXNz"))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[test]
    fn token_signed_with_wrong_secret_is_unauthorized() {
        let client = Client::tracked(test_rocket()).unwrap();
        let token = jwt_helper::create_token("buyer@example.com", b"some_other_secret").unwrap();

        let response = client
            .get("/whoami")
            .header(Header::new("Authorization", format!("Bearer {}", token)))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }
}
