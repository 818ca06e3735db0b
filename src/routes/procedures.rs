//! HTTP routes for procedures and acknowledgments
//!
//! ## Endpoints
//!
//! - `GET  /procedures`                  - List procedures with search/filter/sort
//! - `POST /procedures`                  - Create a procedure (admin)
//! - `PUT  /procedures/{id}`             - Update a procedure (admin)
//! - `GET  /procedures/{id}/stats`       - Acknowledgment statistics for one procedure
//! - `POST /procedures/{id}/acknowledge` - Acknowledge a procedure
//!
//! ## Authentication
//!
//! All endpoints require a session token. Create and update additionally
//! require the admin role; acknowledgment is open to every principal.

use bson::{doc, oid::ObjectId, DateTime};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{extract_token_from_header, Claims, JwtValidator};
use crate::dashboard::{can_acknowledge, empty_state_message, CardStats, FieldError, ListQuery, ProcedureForm};
use crate::db::schemas::{
    AcknowledgmentDoc, ProcedureDoc, ProcedureStatus, ProfileDoc, Role,
    ACKNOWLEDGMENT_COLLECTION, PROCEDURE_COLLECTION, PROFILE_COLLECTION,
};
use crate::db::MongoClient;
use crate::server::AppState;
use crate::types::HubError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Public view of a procedure record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub source_link: String,
    pub effective_date: String,
    pub status: ProcedureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ProcedureResponse {
    fn from_doc(procedure: &ProcedureDoc) -> Self {
        Self {
            id: procedure.id_hex().unwrap_or_default(),
            title: procedure.title.clone(),
            description: procedure.description.clone(),
            source: procedure.source.clone(),
            source_link: procedure.source_link.clone(),
            effective_date: procedure.effective_date.to_string(),
            status: procedure.status,
            created_by: procedure.created_by.clone(),
            created_at: fmt_datetime(procedure.metadata.created_at),
            updated_at: fmt_datetime(procedure.metadata.updated_at),
        }
    }
}

/// Response for the list endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub procedures: Vec<ProcedureResponse>,
    pub total: usize,
    /// Whether the viewer may create procedures (admin only)
    pub can_create: bool,
    /// Copy explaining an empty result, keyed on its cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<String>,
}

/// Creator details shown on a card
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorResponse {
    pub id: String,
    pub full_name: String,
}

/// Response for the per-procedure statistics endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub procedure_id: String,
    pub acknowledged_count: u64,
    pub profile_count: u64,
    pub completion_percent: u32,
    /// Whether the viewing principal has acknowledged this procedure
    pub has_acknowledged: bool,
    /// Whether the acknowledge affordance applies to the viewer
    pub can_acknowledge: bool,
    /// Whether the edit affordance applies to the viewer (admin only)
    pub can_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<CreatorResponse>,
}

/// Response for the acknowledge endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeResponse {
    pub acknowledged: bool,
    /// True when the principal had already acknowledged (no-op)
    pub already_acknowledged: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
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
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

fn error_response(status: StatusCode, error: impl Into<String>, code: Option<&str>) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.into(),
            code: code.map(|c| c.to_string()),
        },
    )
}

fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<Incoming>,
) -> Result<T, HubError> {
    let body = req
        .collect()
        .await
        .map_err(|e| HubError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 65536 {
        return Err(HubError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| HubError::Http(format!("Invalid JSON: {}", e)))
}

fn get_auth_header(req: &Request<Incoming>) -> Option<String> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn get_jwt_validator(state: &AppState) -> Result<JwtValidator, Response<BoxBody>> {
    if state.args.dev_mode {
        Ok(JwtValidator::new_dev())
    } else {
        match &state.args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), state.args.jwt_expiry_seconds)
                .map_err(|e| {
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("JWT configuration error: {}", e),
                        Some("CONFIG_ERROR"),
                    )
                }),
            None => Err(error_response(
                StatusCode::NOT_IMPLEMENTED,
                "Authentication not enabled (missing JWT_SECRET)",
                Some("NOT_ENABLED"),
            )),
        }
    }
}

/// Validate the session token from an Authorization header value
fn authenticate(
    auth_header: Option<&str>,
    state: &AppState,
) -> Result<Claims, Response<BoxBody>> {
    let token = match extract_token_from_header(auth_header) {
        Some(t) => t,
        None => {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "No token provided",
                Some("NO_TOKEN"),
            ))
        }
    };

    let jwt = get_jwt_validator(state)?;
    let result = jwt.verify_token(token);

    if !result.valid {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            result.error.as_deref().unwrap_or("Invalid token"),
            Some("INVALID_TOKEN"),
        ));
    }

    result.claims.ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "Invalid token", Some("INVALID_TOKEN"))
    })
}

/// Validate the session token and require the admin role
fn require_admin(
    auth_header: Option<&str>,
    state: &AppState,
) -> Result<Claims, Response<BoxBody>> {
    let claims = authenticate(auth_header, state)?;

    if claims.role != Role::Admin {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "Admin role required",
            Some("FORBIDDEN"),
        ));
    }

    Ok(claims)
}

fn get_mongo(state: &AppState) -> Result<&MongoClient, Response<BoxBody>> {
    state.mongo.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database not available",
            Some("DB_UNAVAILABLE"),
        )
    })
}

fn parse_procedure_id(id: &str) -> Result<ObjectId, Response<BoxBody>> {
    ObjectId::parse_str(id).map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Invalid procedure id",
            Some("INVALID_ID"),
        )
    })
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /procedures
///
/// Loads the full procedure set in creation order (newest first) and
/// derives the displayed list from the view state in the query string.
/// A store failure is surfaced rather than swallowed into an empty list.
async fn handle_list(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let claims = match authenticate(get_auth_header(&req).as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let query: ListQuery = match serde_urlencoded::from_str(req.uri().query().unwrap_or("")) {
        Ok(q) => q,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid query parameters: {}", e),
                None,
            )
        }
    };

    let mongo = match get_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let procedures = match mongo.collection::<ProcedureDoc>(PROCEDURE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    // Authoritative list: everything, newest creation first
    let all = match procedures
        .find_many_sorted(doc! {}, Some(doc! { "metadata.created_at": -1 }))
        .await
    {
        Ok(list) => list,
        Err(e) => {
            warn!("Procedure list load failed: {}", e);
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to load procedures: {}", e),
                Some("LOAD_FAILED"),
            );
        }
    };

    let displayed = query.apply(&all);
    let is_admin = claims.role == Role::Admin;

    let empty_state = if displayed.is_empty() {
        Some(empty_state_message(query.has_search(), is_admin).to_string())
    } else {
        None
    };

    let response = ListResponse {
        total: displayed.len(),
        procedures: displayed.iter().map(ProcedureResponse::from_doc).collect(),
        can_create: is_admin,
        empty_state,
    };

    json_response(StatusCode::OK, &response)
}

/// POST /procedures
///
/// Create a procedure. Admin only. The status field of the submission is
/// ignored: new procedures always start active.
async fn handle_create(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match require_admin(auth_header.as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let form: ProcedureForm = match parse_json_body(req).await {
        Ok(f) => f,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                None,
            )
        }
    };

    if let Err(fields) = form.validate() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ValidationErrorResponse {
                error: "Validation failed".into(),
                fields,
            },
        );
    }

    let effective_date = match form.effective_date {
        Some(d) => d,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Effective date is required",
                None,
            )
        }
    };

    let mongo = match get_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let procedures = match mongo.collection::<ProcedureDoc>(PROCEDURE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let procedure = ProcedureDoc::new(
        form.title.trim().to_string(),
        form.description,
        form.source,
        form.source_link,
        effective_date,
        claims.sub.clone(),
    );

    let inserted_id = match procedures.insert_one(procedure).await {
        Ok(id) => id,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create procedure: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let oid = match inserted_id.as_object_id() {
        Some(oid) => oid,
        None => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get inserted id",
                Some("DB_ERROR"),
            )
        }
    };

    info!("Procedure created: {} by {}", oid.to_hex(), claims.sub);

    // Read the record back so the response carries server-assigned fields
    match procedures.find_one(doc! { "_id": oid }).await {
        Ok(Some(created)) => json_response(StatusCode::CREATED, &ProcedureResponse::from_doc(&created)),
        Ok(None) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Created procedure not found",
            Some("DB_ERROR"),
        ),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Database error: {}", e),
            Some("DB_ERROR"),
        ),
    }
}

/// PUT /procedures/{id}
///
/// Update all editable fields of a procedure, including status. Admin only.
/// Status is a free-form label: any value may be set to any other.
async fn handle_update(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let auth_header = get_auth_header(&req);
    let claims = match require_admin(auth_header.as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let oid = match parse_procedure_id(id) {
        Ok(oid) => oid,
        Err(resp) => return resp,
    };

    let form: ProcedureForm = match parse_json_body(req).await {
        Ok(f) => f,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                None,
            )
        }
    };

    if let Err(fields) = form.validate() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ValidationErrorResponse {
                error: "Validation failed".into(),
                fields,
            },
        );
    }

    let effective_date = match form.effective_date {
        Some(d) => d,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Effective date is required",
                None,
            )
        }
    };

    let mongo = match get_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let procedures = match mongo.collection::<ProcedureDoc>(PROCEDURE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let update = doc! {
        "$set": {
            "title": form.title.trim(),
            "description": &form.description,
            "source": &form.source,
            "source_link": &form.source_link,
            "effective_date": effective_date.to_string(),
            "status": form.status.to_string(),
            "metadata.updated_at": DateTime::now(),
        }
    };

    let result = match procedures.update_one(doc! { "_id": oid }, update).await {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to update procedure: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    if result.matched_count == 0 {
        return error_response(StatusCode::NOT_FOUND, "Procedure not found", Some("NOT_FOUND"));
    }

    info!("Procedure updated: {} by {}", oid.to_hex(), claims.sub);

    match procedures.find_one(doc! { "_id": oid }).await {
        Ok(Some(updated)) => json_response(StatusCode::OK, &ProcedureResponse::from_doc(&updated)),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Procedure not found",
            Some("NOT_FOUND"),
        ),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Database error: {}", e),
            Some("DB_ERROR"),
        ),
    }
}

/// GET /procedures/{id}/stats
///
/// Per-procedure acknowledgment statistics for the viewing principal:
/// whether they acknowledged, the acknowledgment count, the total profile
/// count (the completion denominator counts every profile regardless of
/// role), and the creator's display name.
async fn handle_stats(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let claims = match authenticate(get_auth_header(&req).as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let oid = match parse_procedure_id(id) {
        Ok(oid) => oid,
        Err(resp) => return resp,
    };

    let mongo = match get_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let procedures = match mongo.collection::<ProcedureDoc>(PROCEDURE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let procedure = match procedures.find_one(doc! { "_id": oid }).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Procedure not found", Some("NOT_FOUND"))
        }
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let acknowledgments = match mongo
        .collection::<AcknowledgmentDoc>(ACKNOWLEDGMENT_COLLECTION)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let has_acknowledged = match acknowledgments
        .find_one(doc! { "procedure_id": oid, "user_id": &claims.sub })
        .await
    {
        Ok(found) => found.is_some(),
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let acknowledged_count = match acknowledgments.count(doc! { "procedure_id": oid }).await {
        Ok(n) => n,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let profiles = match mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let profile_count = match profiles.count(doc! {}).await {
        Ok(n) => n,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    // Creator profile, when the creating admin is known
    let creator = match &procedure.created_by {
        Some(creator_id) => match profiles.find_one(doc! { "_id": creator_id }).await {
            Ok(found) => found.map(|p| CreatorResponse {
                id: p.id,
                full_name: p.full_name,
            }),
            Err(e) => {
                warn!("Creator lookup failed for {}: {}", oid.to_hex(), e);
                None
            }
        },
        None => None,
    };

    let stats = CardStats {
        acknowledged_count,
        profile_count,
    };

    let response = StatsResponse {
        procedure_id: oid.to_hex(),
        acknowledged_count,
        profile_count,
        completion_percent: stats.completion_percent(),
        has_acknowledged,
        can_acknowledge: can_acknowledge(procedure.status, has_acknowledged),
        can_edit: claims.role == Role::Admin,
        creator,
    };

    json_response(StatusCode::OK, &response)
}

/// POST /procedures/{id}/acknowledge
///
/// Record that the principal has read this procedure. The handler checks
/// for an existing acknowledgment first, but the unique compound index is
/// the authoritative backstop: a duplicate-key rejection from a concurrent
/// double-submit is answered as the same no-op.
async fn handle_acknowledge(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let claims = match authenticate(get_auth_header(&req).as_deref(), &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let oid = match parse_procedure_id(id) {
        Ok(oid) => oid,
        Err(resp) => return resp,
    };

    let mongo = match get_mongo(&state) {
        Ok(m) => m,
        Err(resp) => return resp,
    };

    let procedures = match mongo.collection::<ProcedureDoc>(PROCEDURE_COLLECTION).await {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    let procedure = match procedures.find_one(doc! { "_id": oid }).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return error_response(StatusCode::NOT_FOUND, "Procedure not found", Some("NOT_FOUND"))
        }
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    // Only active procedures accept acknowledgments
    if procedure.status != ProcedureStatus::Active {
        return error_response(
            StatusCode::CONFLICT,
            "Only active procedures can be acknowledged",
            Some("NOT_ACTIVE"),
        );
    }

    let acknowledgments = match mongo
        .collection::<AcknowledgmentDoc>(ACKNOWLEDGMENT_COLLECTION)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    };

    // Advisory check; the unique index below is authoritative
    match acknowledgments
        .find_one(doc! { "procedure_id": oid, "user_id": &claims.sub })
        .await
    {
        Ok(Some(_)) => {
            return json_response(
                StatusCode::OK,
                &AcknowledgeResponse {
                    acknowledged: true,
                    already_acknowledged: true,
                },
            )
        }
        Ok(None) => {}
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
                Some("DB_ERROR"),
            )
        }
    }

    let acknowledgment = AcknowledgmentDoc::new(oid, claims.sub.clone());
    if let Err(e) = acknowledgments.insert_one(acknowledgment).await {
        // A concurrent double-submit lost the race against the unique
        // index; answer it as the same no-op
        if e.is_duplicate_key() {
            return json_response(
                StatusCode::OK,
                &AcknowledgeResponse {
                    acknowledged: true,
                    already_acknowledged: true,
                },
            );
        }
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to record acknowledgment: {}", e),
            Some("DB_ERROR"),
        );
    }

    info!("Acknowledged: {} by {}", oid.to_hex(), claims.sub);

    json_response(
        StatusCode::OK,
        &AcknowledgeResponse {
            acknowledged: true,
            already_acknowledged: false,
        },
    )
}

// =============================================================================
// Main Router
// =============================================================================

/// Main handler for /procedures/* routes
pub async fn handle_procedure_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<BoxBody> {
    let method = req.method().clone();

    // Extract subpath after /procedures
    let subpath = path.strip_prefix("/procedures").unwrap_or("");

    match (method, subpath) {
        // GET /procedures - List with search/filter/sort
        (Method::GET, "") | (Method::GET, "/") => handle_list(req, state).await,

        // POST /procedures - Create
        (Method::POST, "") | (Method::POST, "/") => handle_create(req, state).await,

        // GET /procedures/{id}/stats
        (Method::GET, p) if p.ends_with("/stats") => {
            let id = p.trim_start_matches('/').trim_end_matches("/stats").trim_end_matches('/');
            handle_stats(req, state, id).await
        }

        // POST /procedures/{id}/acknowledge
        (Method::POST, p) if p.ends_with("/acknowledge") => {
            let id = p
                .trim_start_matches('/')
                .trim_end_matches("/acknowledge")
                .trim_end_matches('/');
            handle_acknowledge(req, state, id).await
        }

        // PUT /procedures/{id} - Update
        (Method::PUT, p) => {
            let id = p.trim_start_matches('/');
            if id.is_empty() || id.contains('/') {
                error_response(StatusCode::NOT_FOUND, "Not found", None)
            } else {
                handle_update(req, state, id).await
            }
        }

        _ => error_response(StatusCode::NOT_FOUND, "Not found", None),
    }
}
