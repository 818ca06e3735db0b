//! HTTP routes for authentication
//!
//! REST API endpoints for the identity provider:
//! - POST /auth/register - Create an account and its profile record
//! - POST /auth/login    - Authenticate and get a session token
//! - POST /auth/logout   - End the session (client-side, tokens are stateless)
//! - GET  /auth/me       - Resolve the current session to the live profile
//!
//! Registration deliberately does NOT sign the new account in: the response
//! instructs the user to sign in, and clients switch their form to sign-in
//! mode on success.

use bson::doc;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    extract_token_from_header, hash_password, verify_password, JwtValidator, TokenInput,
};
use crate::db::schemas::{
    CredentialDoc, ProfileDoc, Role, CREDENTIAL_COLLECTION, PROFILE_COLLECTION,
};
use crate::server::AppState;
use crate::types::HubError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    /// Self-selected; there is no invitation or approval flow
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileResponse>,
}

/// Public view of a profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ProfileResponse {
    pub fn from_doc(profile: &ProfileDoc) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
            created_at: fmt_datetime(profile.metadata.created_at),
            updated_at: fmt_datetime(profile.metadata.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

// =============================================================================
// Response Helpers
// =============================================================================

fn fmt_datetime(dt: Option<bson::DateTime>) -> Option<String> {
    dt.and_then(|d| d.try_to_rfc3339_string().ok())
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, HubError> {
    let body = req
        .collect()
        .await
        .map_err(|e| HubError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(HubError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| HubError::Http(format!("Invalid JSON: {}", e)))
}

fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

fn get_jwt_validator(state: &AppState) -> Result<JwtValidator, Response<BoxBody>> {
    if state.args.dev_mode {
        Ok(JwtValidator::new_dev())
    } else {
        match &state.args.jwt_secret {
            Some(secret) => {
                JwtValidator::new(secret.clone(), state.args.jwt_expiry_seconds).map_err(|e| {
                    json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        &ErrorResponse {
                            error: format!("JWT configuration error: {}", e),
                            code: Some("CONFIG_ERROR".into()),
                        },
                    )
                })
            }
            None => Err(json_response(
                StatusCode::NOT_IMPLEMENTED,
                &ErrorResponse {
                    error: "Authentication not enabled (missing JWT_SECRET)".into(),
                    code: Some("NOT_ENABLED".into()),
                },
            )),
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/register
///
/// Create sign-in credentials and the linked profile record.
///
/// Flow:
/// 1. Validate required fields and password length
/// 2. Check if the email already exists
/// 3. Hash password with argon2
/// 4. Store the credential and the profile (the post-registration hook)
/// 5. Respond WITHOUT a token - the user is instructed to sign in
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: format!("Invalid JSON body: {}", e),
                    code: None,
                },
            )
        }
    };

    if body.email.trim().is_empty() || body.password.is_empty() || body.full_name.trim().is_empty()
    {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Missing required fields: email, password, full name".into(),
                code: None,
            },
        );
    }

    if body.password.len() < 6 {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Password must be at least 6 characters".into(),
                code: Some("WEAK_PASSWORD".into()),
            },
        );
    }

    // In dev mode without MongoDB, pretend the account was created
    if state.args.dev_mode && state.mongo.is_none() {
        info!("Dev mode register (no MongoDB): {}", body.email);
        return json_response(
            StatusCode::CREATED,
            &RegisterResponse {
                success: true,
                message: "Account created! Please sign in.".into(),
            },
        );
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &ErrorResponse {
                    error: "Database not available".into(),
                    code: Some("DB_UNAVAILABLE".into()),
                },
            )
        }
    };

    let credentials = match mongo.collection::<CredentialDoc>(CREDENTIAL_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    // Check if the email is already registered
    match credentials.find_one(doc! { "email": &body.email }).await {
        Ok(Some(_)) => {
            return json_response(
                StatusCode::CONFLICT,
                &ErrorResponse {
                    error: "An account with this email already exists".into(),
                    code: Some("USER_EXISTS".into()),
                },
            )
        }
        Ok(None) => {}
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Failed to hash password: {}", e),
                    code: Some("HASH_ERROR".into()),
                },
            )
        }
    };

    // The session subject the credential will sign in as
    let user_id = uuid::Uuid::new_v4().to_string();

    let credential = CredentialDoc::new(body.email.clone(), password_hash, user_id.clone());
    if let Err(e) = credentials.insert_one(credential).await {
        // Duplicate key means a concurrent registration won the race
        if e.is_duplicate_key() {
            return json_response(
                StatusCode::CONFLICT,
                &ErrorResponse {
                    error: "An account with this email already exists".into(),
                    code: Some("USER_EXISTS".into()),
                },
            );
        }
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: format!("Failed to create account: {}", e),
                code: Some("DB_ERROR".into()),
            },
        );
    }

    // Create the linked profile record. The calls are uncoordinated (no
    // multi-document transaction); a failure here is surfaced as-is.
    let profiles = match mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    let profile = ProfileDoc::new(
        user_id.clone(),
        body.email.clone(),
        body.full_name.trim().to_string(),
        body.role,
    );
    if let Err(e) = profiles.insert_one(profile).await {
        warn!("Profile creation failed for {}: {}", body.email, e);
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: format!("Failed to create profile: {}", e),
                code: Some("DB_ERROR".into()),
            },
        );
    }

    info!("Registered new user: {} (role: {})", body.email, body.role);

    json_response(
        StatusCode::CREATED,
        &RegisterResponse {
            success: true,
            message: "Account created! Please sign in.".into(),
        },
    )
}

/// POST /auth/login
///
/// Authenticate with email and password.
///
/// Flow:
/// 1. Look up the credential by email
/// 2. Verify the password hash with argon2
/// 3. Load the profile and issue a session token
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: format!("Invalid JSON body: {}", e),
                    code: None,
                },
            )
        }
    };

    if body.email.trim().is_empty() || body.password.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Missing required fields: email, password".into(),
                code: None,
            },
        );
    }

    let jwt = match get_jwt_validator(&state) {
        Ok(j) => j,
        Err(resp) => return resp,
    };

    // In dev mode without MongoDB, accept any credentials
    if state.args.dev_mode && state.mongo.is_none() {
        info!("Dev mode login (no MongoDB): {}", body.email);
        return generate_auth_response(
            &jwt,
            &format!("dev-{}", body.email),
            &body.email,
            Role::Staff,
            None,
        );
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &ErrorResponse {
                    error: "Database not available".into(),
                    code: Some("DB_UNAVAILABLE".into()),
                },
            )
        }
    };

    let credentials = match mongo.collection::<CredentialDoc>(CREDENTIAL_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    let credential = match credentials
        .find_one(doc! { "email": &body.email, "is_active": true })
        .await
    {
        Ok(Some(c)) => c,
        Ok(None) => {
            warn!("Login failed - user not found: {}", body.email);
            // Use generic error to prevent user enumeration
            return json_response(
                StatusCode::UNAUTHORIZED,
                &ErrorResponse {
                    error: "Invalid credentials".into(),
                    code: Some("INVALID_CREDENTIALS".into()),
                },
            );
        }
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    let password_valid = match verify_password(&body.password, &credential.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Password verification error: {}", e);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: "Authentication error".into(),
                    code: Some("AUTH_ERROR".into()),
                },
            );
        }
    };

    if !password_valid {
        warn!("Login failed - invalid password: {}", body.email);
        return json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse {
                error: "Invalid credentials".into(),
                code: Some("INVALID_CREDENTIALS".into()),
            },
        );
    }

    // Resolve the profile for role and display data
    let profiles = match mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    let profile = match profiles.find_one(doc! { "_id": &credential.user_id }).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            warn!("Login failed - profile missing for {}", body.email);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: "Profile record missing for this account".into(),
                    code: Some("PROFILE_MISSING".into()),
                },
            );
        }
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    info!("Login successful: {}", body.email);

    let profile_response = ProfileResponse::from_doc(&profile);
    generate_auth_response(
        &jwt,
        &profile.id,
        &profile.email,
        profile.role,
        Some(profile_response),
    )
}

/// POST /auth/logout
///
/// Logout is handled client-side by discarding the token; tokens are
/// stateless.
async fn handle_logout(
    _req: Request<hyper::body::Incoming>,
    _state: Arc<AppState>,
) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Signed out".into(),
        },
    )
}

/// GET /auth/me
///
/// Resolve the current session to the live profile. The role comes from the
/// store, not the token, so role edits take effect on the next resolution.
async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let token = match extract_token_from_header(auth_header) {
        Some(t) => t,
        None => {
            return json_response(
                StatusCode::UNAUTHORIZED,
                &ErrorResponse {
                    error: "No token provided".into(),
                    code: None,
                },
            )
        }
    };

    let jwt = match get_jwt_validator(&state) {
        Ok(j) => j,
        Err(resp) => return resp,
    };

    let result = jwt.verify_token(token);
    if !result.valid {
        return json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse {
                error: result
                    .error
                    .unwrap_or_else(|| "Invalid or expired token".into()),
                code: None,
            },
        );
    }

    let claims = match result.claims {
        Some(c) => c,
        None => {
            return json_response(
                StatusCode::UNAUTHORIZED,
                &ErrorResponse {
                    error: "Invalid token".into(),
                    code: None,
                },
            )
        }
    };

    // In dev mode without MongoDB, answer from the claims alone
    let mongo = match &state.mongo {
        Some(m) => m,
        None => {
            return json_response(
                StatusCode::OK,
                &ProfileResponse {
                    id: claims.sub,
                    email: claims.email,
                    full_name: String::new(),
                    role: claims.role,
                    created_at: None,
                    updated_at: None,
                },
            )
        }
    };

    let profiles = match mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    error: format!("Database error: {}", e),
                    code: Some("DB_ERROR".into()),
                },
            )
        }
    };

    match profiles.find_one(doc! { "_id": &claims.sub }).await {
        Ok(Some(profile)) => json_response(StatusCode::OK, &ProfileResponse::from_doc(&profile)),
        Ok(None) => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Profile not found".into(),
                code: Some("PROFILE_NOT_FOUND".into()),
            },
        ),
        Err(e) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: format!("Database error: {}", e),
                code: Some("DB_ERROR".into()),
            },
        ),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Generate a successful auth response with a session token
fn generate_auth_response(
    jwt: &JwtValidator,
    sub: &str,
    email: &str,
    role: Role,
    profile: Option<ProfileResponse>,
) -> Response<BoxBody> {
    let input = TokenInput {
        sub: sub.to_string(),
        email: email.to_string(),
        role,
    };

    match jwt.generate_token(input) {
        Ok(token) => {
            let claims = jwt.verify_token(&token);
            let expires_at = claims.claims.map(|c| c.exp).unwrap_or(0);

            json_response(
                StatusCode::OK,
                &AuthResponse {
                    token,
                    expires_at,
                    profile,
                },
            )
        }
        Err(e) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: format!("Failed to generate token: {}", e),
                code: Some("TOKEN_ERROR".into()),
            },
        ),
    }
}

// =============================================================================
// Main Router
// =============================================================================

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if the request was handled, None if not an auth
/// route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    // Only handle /auth/* routes
    if !path.starts_with("/auth") {
        return None;
    }

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Remove query string for matching
    let path = path.split('?').next().unwrap_or(path);

    let response = match (method, path) {
        (&Method::POST, "/auth/register") => handle_register(req, state).await,
        (&Method::POST, "/auth/login") => handle_login(req, state).await,
        (&Method::POST, "/auth/logout") => handle_logout(req, state).await,
        (&Method::GET, "/auth/me") => handle_me(req, state).await,

        // Method not allowed
        (_, "/auth/register") | (_, "/auth/login") | (_, "/auth/logout") | (_, "/auth/me") => {
            json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &ErrorResponse {
                    error: "Method not allowed".into(),
                    code: None,
                },
            )
        }

        // Auth endpoint not found
        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: "Auth endpoint not found".into(),
                code: None,
            },
        ),
    };

    Some(response)
}
