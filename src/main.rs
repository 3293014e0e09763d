#[macro_use]
extern crate rocket;

mod config;
mod jwt;
mod models;
mod repository;
mod services;

use mongodb::bson::{oid::ObjectId, Document};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::http::Status;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::{Build, Request, Response, Rocket, State};
use rocket::{catch, catchers, delete, get, options, patch, post, routes};

use config::app_config::AppConfig;
use config::mongo_config::setup_mongo;
use models::bid::Bid;
use models::product::{Product, ProductPatch};
use models::user::User;
use repository::{
    bid_repository::BidRepository, product_repository::ProductRepository,
    user_repository::UserRepository,
};
use services::auth_guard::AuthenticatedUser;

// CORS fairing
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
    }
}

// CORS preflight route
#[options("/<_path..>")]
fn all_options(_path: std::path::PathBuf) -> Status {
    Status::Ok
}

// API response envelope
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub message: String,
    pub result: Option<T>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateAck {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DeleteAck {
    pub deleted_count: u64,
}

#[get("/")]
fn index() -> &'static str {
    "Smart server is running"
}

#[derive(Deserialize, Serialize, Debug)]
pub struct NewUserRequest {
    pub email: Option<String>,
    #[serde(flatten)]
    pub profile: Document,
}

// Create a user, keyed by email. The existence check and the insert are two
// separate store calls; concurrent posts with the same email can both pass
// the check (known non-atomic policy).
#[post("/users", format = "json", data = "<new_user>")]
async fn create_user(
    user_repo: &State<UserRepository>,
    app_config: &State<AppConfig>,
    new_user: Json<NewUserRequest>,
) -> (Status, Json<ApiResponse<(User, String)>>) {
    let new_user = new_user.into_inner();
    let email = match new_user.email {
        Some(ref email) if !email.trim().is_empty() => email.clone(),
        _ => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - email is required".to_string(),
                    result: None,
                }),
            )
        }
    };

    match user_repo.find_user_by_email(&email).await {
        Ok(Some(existing_user)) => {
            let token = jwt::jwt_helper::create_token(&email, app_config.jwt_secret.as_bytes())
                .unwrap_or_else(|_| "Error creating token".to_string());

            (
                Status::Ok,
                Json(ApiResponse {
                    message: "200: user already exists. do not need to insert again".to_string(),
                    result: Some((existing_user, token)),
                }),
            )
        }
        Ok(None) => {
            let user = User {
                id: None,
                email: email.clone(),
                profile: new_user.profile,
            };

            match user_repo.create_user(user).await {
                Ok(created_user) => {
                    let token =
                        jwt::jwt_helper::create_token(&email, app_config.jwt_secret.as_bytes())
                            .unwrap_or_else(|_| "Error creating token".to_string());

                    (
                        Status::Created,
                        Json(ApiResponse {
                            message: "201: Created".to_string(),
                            result: Some((created_user, token)),
                        }),
                    )
                }
                Err(e) => {
                    eprintln!("Error creating user: {:?}", e);
                    (
                        Status::InternalServerError,
                        Json(ApiResponse {
                            message: "500: Internal Server Error".to_string(),
                            result: None,
                        }),
                    )
                }
            }
        }
        Err(e) => {
            eprintln!("Error finding user: {:?}", e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[get("/products?<email>")]
async fn get_products(
    product_repo: &State<ProductRepository>,
    email: Option<String>,
) -> (Status, Json<ApiResponse<Vec<Product>>>) {
    match product_repo.get_products(email.as_deref()).await {
        Ok(products) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(products),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /products: {:?}", e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[get("/latest-products")]
async fn get_latest_products(
    product_repo: &State<ProductRepository>,
) -> (Status, Json<ApiResponse<Vec<Product>>>) {
    match product_repo.get_latest_products().await {
        Ok(products) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(products),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /latest-products: {:?}", e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[get("/products/<id>")]
async fn get_product_by_id(
    product_repo: &State<ProductRepository>,
    id: &str,
) -> (Status, Json<ApiResponse<Product>>) {
    let object_id = match ObjectId::parse_str(id) {
        Ok(object_id) => object_id,
        Err(_) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - Invalid product ID".to_string(),
                    result: None,
                }),
            )
        }
    };

    match product_repo.find_product_by_id(object_id).await {
        Ok(Some(product)) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(product),
            }),
        ),
        Ok(None) => (
            Status::NotFound,
            Json(ApiResponse {
                message: "404: Not Found - Product not found".to_string(),
                result: None,
            }),
        ),
        Err(e) => {
            eprintln!("Error in /products/{}: {:?}", id, e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

// Requires a verified caller; the guard rejects missing/invalid tokens with 401.
#[post("/products", format = "json", data = "<new_product>")]
async fn create_product(
    _auth: AuthenticatedUser,
    product_repo: &State<ProductRepository>,
    new_product: Json<Product>,
) -> (Status, Json<ApiResponse<Product>>) {
    match product_repo.create_product(new_product.into_inner()).await {
        Ok(created_product) => (
            Status::Created,
            Json(ApiResponse {
                message: "201: Created".to_string(),
                result: Some(created_product),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /products POST: {:?}", e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

// Only name and price are updatable; other body fields are dropped.
#[patch("/products/<id>", format = "json", data = "<product_patch>")]
async fn update_product(
    product_repo: &State<ProductRepository>,
    id: &str,
    product_patch: Json<ProductPatch>,
) -> (Status, Json<ApiResponse<UpdateAck>>) {
    let object_id = match ObjectId::parse_str(id) {
        Ok(object_id) => object_id,
        Err(_) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - Invalid product ID".to_string(),
                    result: None,
                }),
            )
        }
    };

    match product_repo.update_product(object_id, &product_patch).await {
        Ok(Some(result)) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(UpdateAck {
                    matched_count: result.matched_count,
                    modified_count: result.modified_count,
                }),
            }),
        ),
        Ok(None) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Nothing to update".to_string(),
                result: Some(UpdateAck {
                    matched_count: 0,
                    modified_count: 0,
                }),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /products/{} PATCH: {:?}", id, e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[delete("/products/<id>")]
async fn delete_product(
    product_repo: &State<ProductRepository>,
    id: &str,
) -> (Status, Json<ApiResponse<DeleteAck>>) {
    let object_id = match ObjectId::parse_str(id) {
        Ok(object_id) => object_id,
        Err(_) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - Invalid product ID".to_string(),
                    result: None,
                }),
            )
        }
    };

    match product_repo.delete_product(object_id).await {
        Ok(result) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(DeleteAck {
                    deleted_count: result.deleted_count,
                }),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /products/{} DELETE: {:?}", id, e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

// Requires a verified caller; an email filter must match the token identity.
#[get("/bids?<email>")]
async fn get_bids(
    auth: AuthenticatedUser,
    bid_repo: &State<BidRepository>,
    email: Option<String>,
) -> (Status, Json<ApiResponse<Vec<Bid>>>) {
    if let Some(ref email) = email {
        if *email != auth.email {
            return (
                Status::Forbidden,
                Json(ApiResponse {
                    message: "403: Forbidden - email does not match token identity".to_string(),
                    result: None,
                }),
            );
        }
    }

    match bid_repo.get_bids(email.as_deref()).await {
        Ok(bids) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(bids),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /bids: {:?}", e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[get("/products/bids/<product_id>")]
async fn get_bids_for_product(
    bid_repo: &State<BidRepository>,
    product_id: &str,
) -> (Status, Json<ApiResponse<Vec<Bid>>>) {
    match bid_repo.get_bids_for_product(product_id).await {
        Ok(bids) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(bids),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /products/bids/{}: {:?}", product_id, e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[post("/bids", format = "json", data = "<new_bid>")]
async fn create_bid(
    bid_repo: &State<BidRepository>,
    new_bid: Json<Bid>,
) -> (Status, Json<ApiResponse<Bid>>) {
    match bid_repo.create_bid(new_bid.into_inner()).await {
        Ok(created_bid) => (
            Status::Created,
            Json(ApiResponse {
                message: "201: Created".to_string(),
                result: Some(created_bid),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /bids POST: {:?}", e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[delete("/bids/<id>")]
async fn delete_bid(
    bid_repo: &State<BidRepository>,
    id: &str,
) -> (Status, Json<ApiResponse<DeleteAck>>) {
    let object_id = match ObjectId::parse_str(id) {
        Ok(object_id) => object_id,
        Err(_) => {
            return (
                Status::BadRequest,
                Json(ApiResponse {
                    message: "400: Bad Request - Invalid bid ID".to_string(),
                    result: None,
                }),
            )
        }
    };

    match bid_repo.delete_bid(object_id).await {
        Ok(result) => (
            Status::Ok,
            Json(ApiResponse {
                message: "200: Success".to_string(),
                result: Some(DeleteAck {
                    deleted_count: result.deleted_count,
                }),
            }),
        ),
        Err(e) => {
            eprintln!("Error in /bids/{} DELETE: {:?}", id, e);
            (
                Status::InternalServerError,
                Json(ApiResponse {
                    message: "500: Internal Server Error".to_string(),
                    result: None,
                }),
            )
        }
    }
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        message: format!("404: '{}' route not found", req.uri()),
        result: None,
    })
}

#[catch(401)]
fn unauthorized() -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        message: "401: Unauthorized - missing or invalid token".to_string(),
        result: None,
    })
}

fn build_rocket(app_config: AppConfig, client: mongodb::Client) -> Rocket<Build> {
    let user_repo = UserRepository::new(&client);
    let product_repo = ProductRepository::new(&client);
    let bid_repo = BidRepository::new(&client);

    rocket::build()
        .manage(app_config)
        .manage(user_repo)
        .manage(product_repo)
        .manage(bid_repo)
        .attach(CORS)
        .mount(
            "/",
            routes![
                index,
                all_options,
                create_user,
                get_products,
                get_latest_products,
                get_product_by_id,
                create_product,
                update_product,
                delete_product,
                get_bids,
                get_bids_for_product,
                create_bid,
                delete_bid,
            ],
        )
        .register("/", catchers![not_found, unauthorized])
}

#[launch]
async fn rocket() -> _ {
    let app_config = AppConfig::from_env();
    let client = setup_mongo(&app_config)
        .await
        .expect("failed to build MongoDB client");

    build_rocket(app_config, client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::{ContentType, Header};
    use rocket::local::asynchronous::Client;
    use serde_json::Value;

    const TEST_SECRET: &str = "route_test_secret";

    // The driver connects lazily, so these tests only exercise paths that
    // are rejected before any store call.
    async fn test_client() -> Client {
        let app_config = AppConfig {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            jwt_secret: TEST_SECRET.to_string(),
        };
        let mongo = setup_mongo(&app_config).await.unwrap();
        Client::tracked(build_rocket(app_config, mongo)).await.unwrap()
    }

    fn bearer(email: &str) -> Header<'static> {
        let token = jwt::jwt_helper::create_token(email, TEST_SECRET.as_bytes()).unwrap();
        Header::new("Authorization", format!("Bearer {}", token))
    }

    #[rocket::async_test]
    async fn root_reports_liveness() {
        let client = test_client().await;
        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "Smart server is running");
    }

    #[rocket::async_test]
    async fn user_without_email_is_rejected() {
        let client = test_client().await;
        let response = client
            .post("/users")
            .header(ContentType::JSON)
            .body(r#"{"display_name":"No Email"}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        let body: Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body["message"].as_str().unwrap().contains("email is required"));
    }

    #[rocket::async_test]
    async fn malformed_product_id_never_reaches_the_store() {
        let client = test_client().await;

        let response = client.get("/products/not-an-object-id").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .patch("/products/not-an-object-id")
            .header(ContentType::JSON)
            .body(r#"{"name":"Lamp","price":20}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client.delete("/products/not-an-object-id").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn malformed_bid_id_is_rejected() {
        let client = test_client().await;
        let response = client.delete("/bids/zzz").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn product_creation_requires_a_token() {
        let client = test_client().await;
        let response = client
            .post("/products")
            .header(ContentType::JSON)
            .body(r#"{"name":"Lamp","price":20.0}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("401"));
    }

    #[rocket::async_test]
    async fn bids_require_a_token() {
        let client = test_client().await;
        let response = client.get("/bids").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn bid_email_filter_must_match_token_identity() {
        let client = test_client().await;
        let response = client
            .get("/bids?email=someone-else@example.com")
            .header(bearer("buyer@example.com"))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
        let body: Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("403"));
    }

    #[rocket::async_test]
    async fn preflight_gets_cors_headers() {
        let client = test_client().await;
        let response = client.options("/products").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
    }
}
