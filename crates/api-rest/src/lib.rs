//! # API REST
//!
//! REST API for Envoy form mapping.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (content types, CORS, status codes)
//!
//! Every request body is a form submission, sent either urlencoded or as a JSON object of
//! field names. Document building itself lives in `envoy-forms`.

#![warn(rust_2018_idioms)]

pub mod config;

pub use config::{ServerConfig, ServerConfigError};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use envoy_forms::choices::{with_placeholder, ChoiceKind};
use envoy_forms::{
    transport, BuildOptions, DocumentBuilder, Envelope, FormData, FormInput, FormsError,
    LegalPerson, NaturalPerson, NumericFallback, Prepare, Transaction, Vocabulary,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(cfg: Arc<ServerConfig>) -> Self {
        Self { cfg }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body, matching what the dashboard pages read from failed requests.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChoiceItem {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChoiceRes {
    pub kind: String,
    pub choices: Vec<ChoiceItem>,
}

/// Per-request overrides of the configured build policies.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuildQuery {
    /// Read only the fields under this prefix.
    pub prefix: Option<String>,
    /// Reject malformed amounts instead of keeping their text.
    pub strict: Option<bool>,
    /// Stamp `sent_at` with the current time when absent.
    pub stamp_sent_at: Option<bool>,
    /// Envelope key vocabulary: `ivms` (default) or `snake-case`.
    pub vocabulary: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChoiceQuery {
    /// Prepend the list's "please select" entry.
    pub placeholder: Option<bool>,
}

type ApiError = (StatusCode, Json<ErrorRes>);
type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
        }),
    )
}

fn forms_error(err: FormsError) -> ApiError {
    let status = match &err {
        FormsError::MalformedNumeric { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        FormsError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        FormsError::InvalidInputKind(_)
        | FormsError::InvalidJson { .. }
        | FormsError::InvalidPrefix(_)
        | FormsError::InvalidEncoding(_) => StatusCode::BAD_REQUEST,
    };
    if status.is_server_error() {
        tracing::error!("Form mapping error: {:?}", err);
    } else {
        tracing::warn!("Rejected form: {}", err);
    }
    api_error(status, err.to_string())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        build_envelope,
        build_envelope_transport,
        build_prepare,
        build_natural_person,
        build_legal_person,
        build_transaction,
        decode_form,
        list_choices,
    ),
    components(schemas(HealthRes, ErrorRes, ChoiceItem, ChoiceRes))
)]
struct ApiDoc;

/// Build the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/envelope", post(build_envelope))
        .route("/v1/envelope/transport", post(build_envelope_transport))
        .route("/v1/prepare", post(build_prepare))
        .route("/v1/natural-person", post(build_natural_person))
        .route("/v1/legal-person", post(build_legal_person))
        .route("/v1/transaction", post(build_transaction))
        .route("/v1/decode", post(decode_form))
        .route("/v1/choices/:kind", get(list_choices))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Parse a request body according to its content type.
///
/// JSON bodies must be an object of field names; anything else is read as urlencoded.
fn read_form(headers: &HeaderMap, body: &str) -> ApiResult<FormData> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/json"))
        .unwrap_or(false);

    let input = if is_json {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            tracing::warn!("Rejected JSON body: {}", e);
            api_error(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"))
        })?;
        FormInput::Json(value)
    } else {
        FormInput::Urlencoded(body.to_owned())
    };

    input.into_form_data().map_err(forms_error)
}

fn options(state: &AppState, query: &BuildQuery) -> BuildOptions {
    let mut options = state.cfg.build_options();
    if let Some(strict) = query.strict {
        options.amount = if strict {
            NumericFallback::Reject
        } else {
            NumericFallback::KeepText
        };
    }
    if let Some(stamp) = query.stamp_sent_at {
        options.stamp_sent_at = stamp;
    }
    options
}

fn vocabulary(query: &BuildQuery) -> ApiResult<Vocabulary> {
    match query.vocabulary.as_deref() {
        Some(name) => name
            .parse()
            .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e)),
        None => Ok(Vocabulary::default()),
    }
}

fn build<B: DocumentBuilder>(
    state: &AppState,
    query: &BuildQuery,
    headers: &HeaderMap,
    body: &str,
) -> ApiResult<B> {
    let form = read_form(headers, body)?;
    let options = options(state, query);
    tracing::debug!("building from {} fields", form.len());
    B::from_form(&form, query.prefix.as_deref(), &options).map_err(forms_error)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Envoy REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/v1/envelope",
    params(BuildQuery),
    request_body(content = String, description = "Form fields, urlencoded or as a JSON object"),
    responses(
        (status = 200, description = "Travel rule envelope", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 422, description = "Malformed amount", body = ErrorRes)
    )
)]
/// Build a travel rule envelope from a submitted form.
///
/// # Errors
/// Returns `400 Bad Request` for an unreadable body or preloaded document, and
/// `422 Unprocessable Entity` for a malformed amount when strict numeric parsing is on.
async fn build_envelope(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<Value>> {
    let vocabulary = vocabulary(&query)?;
    let envelope: Envelope = build(&state, &query, &headers, &body)?;
    Ok(Json(envelope.in_vocabulary(vocabulary).into_document()))
}

#[utoipa::path(
    post,
    path = "/v1/envelope/transport",
    params(BuildQuery),
    request_body(content = String, description = "Form fields, urlencoded or as a JSON object"),
    responses(
        (status = 200, description = "Envelope as urlencoded transport parameters", body = String,
            content_type = "application/x-www-form-urlencoded"),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 422, description = "Malformed amount", body = ErrorRes)
    )
)]
/// Build an envelope and flatten it into `json:`-tagged transport parameters.
async fn build_envelope_transport(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Response> {
    let vocabulary = vocabulary(&query)?;
    let envelope = build::<Envelope>(&state, &query, &headers, &body)?.in_vocabulary(vocabulary);
    let params = transport::encode_entries(envelope.entries()).map_err(forms_error)?;
    Ok((
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        params.to_urlencoded(),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/v1/prepare",
    params(BuildQuery),
    request_body(content = String, description = "Send form fields, urlencoded or as a JSON object"),
    responses(
        (status = 200, description = "Prepared transfer payload", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 422, description = "Malformed amount", body = ErrorRes)
    )
)]
/// Build the prepare-transfer payload from the send form.
async fn build_prepare(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<Value>> {
    let prepared: Prepare = build(&state, &query, &headers, &body)?;
    Ok(Json(prepared.into_document()))
}

#[utoipa::path(
    post,
    path = "/v1/natural-person",
    params(BuildQuery),
    request_body(content = String, description = "Form fields, urlencoded or as a JSON object"),
    responses(
        (status = 200, description = "IVMS101 natural person", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
async fn build_natural_person(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<Value>> {
    let person: NaturalPerson = build(&state, &query, &headers, &body)?;
    Ok(Json(person.into_document()))
}

#[utoipa::path(
    post,
    path = "/v1/legal-person",
    params(BuildQuery),
    request_body(content = String, description = "Form fields, urlencoded or as a JSON object"),
    responses(
        (status = 200, description = "IVMS101 legal person", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
async fn build_legal_person(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<Value>> {
    let person: LegalPerson = build(&state, &query, &headers, &body)?;
    Ok(Json(person.into_document()))
}

#[utoipa::path(
    post,
    path = "/v1/transaction",
    params(BuildQuery),
    request_body(content = String, description = "Form fields, urlencoded or as a JSON object"),
    responses(
        (status = 200, description = "Transaction details", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 422, description = "Malformed amount", body = ErrorRes)
    )
)]
async fn build_transaction(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<Value>> {
    let transaction: Transaction = build(&state, &query, &headers, &body)?;
    Ok(Json(transaction.into_document()))
}

#[utoipa::path(
    post,
    path = "/v1/decode",
    request_body(content = String, description = "Transport parameters, urlencoded",
        content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Decoded JSON object", body = Object),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Decode transport parameters the way the page-update request encoder does.
///
/// Repeated keys become arrays and `json:` keys are parsed.
async fn decode_form(headers: HeaderMap, body: String) -> ApiResult<Json<Value>> {
    let form = read_form(&headers, &body)?;
    transport::decode_parameters(&form)
        .map(Json)
        .map_err(forms_error)
}

#[utoipa::path(
    get,
    path = "/v1/choices/{kind}",
    params(
        ("kind" = String, Path, description = "Choice list, e.g. address-type"),
        ChoiceQuery
    ),
    responses(
        (status = 200, description = "Select options", body = ChoiceRes),
        (status = 404, description = "Unknown choice list", body = ErrorRes)
    )
)]
/// List the options of an IVMS101 code list.
async fn list_choices(
    Path(kind): Path<String>,
    Query(query): Query<ChoiceQuery>,
) -> ApiResult<Json<ChoiceRes>> {
    let kind: ChoiceKind = kind
        .parse()
        .map_err(|e: String| api_error(StatusCode::NOT_FOUND, e))?;

    let options = kind.options();
    let choices = if query.placeholder.unwrap_or(false) {
        with_placeholder(&options, kind.placeholder())
    } else {
        options
    };

    Ok(Json(ChoiceRes {
        kind: kind.to_string(),
        choices: choices
            .into_iter()
            .map(|c| ChoiceItem {
                value: c.value.to_owned(),
                label: c.label.to_owned(),
            })
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    fn app(cfg: ServerConfig) -> Router {
        router(AppState::new(Arc::new(cfg)))
    }

    fn default_app() -> Router {
        app(ServerConfig::from_env_values(None, None, None).unwrap())
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn post(uri: &str, content_type: &str, body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.into()))
            .unwrap()
    }

    const URLENCODED: &str = "application/x-www-form-urlencoded";

    #[tokio::test]
    async fn health_is_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        let res: HealthRes = serde_json::from_slice(&body).unwrap();
        assert!(res.ok);
    }

    #[tokio::test]
    async fn builds_envelope_from_urlencoded_form() {
        let body = "originator_naturalPerson_countryOfResidence=US\
                    &transaction_originator=bc1q+orig\
                    &transaction_amount=1.5\
                    &sent_at=2024-05-01T12%3A00%3A00Z";
        let (status, bytes) = send(default_app(), post("/v1/envelope", URLENCODED, body)).await;
        assert_eq!(status, StatusCode::OK);

        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["transaction"]["amount"], json!(1.5));
        assert_eq!(doc["identity"]["originator"]["accountNumber"], json!(["bc1q orig"]));
        assert_eq!(doc["sent_at"], json!("2024-05-01T12:00:00Z"));
    }

    #[tokio::test]
    async fn builds_from_json_object_body() {
        let body = json!({
            "vasp_name_nameIdentifier_0_legalPersonName": "Acme",
            "vasp_countryOfRegistration": "GB"
        });
        let request = post(
            "/v1/legal-person?prefix=vasp",
            "application/json",
            body.to_string(),
        );
        let (status, bytes) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["name"]["nameIdentifier"][0]["legalPersonName"], json!("Acme"));
        assert_eq!(doc["countryOfRegistration"], json!("GB"));
    }

    #[tokio::test]
    async fn nested_json_body_is_bad_request() {
        let request = post(
            "/v1/transaction",
            "application/json",
            json!({"transaction": {"txid": "0x1"}}).to_string(),
        );
        let (status, bytes) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorRes = serde_json::from_slice(&bytes).unwrap();
        assert!(err.error.contains("transaction"));
    }

    #[tokio::test]
    async fn strict_amount_is_unprocessable() {
        let request = post(
            "/v1/transaction?prefix=transaction&strict=true",
            URLENCODED,
            "transaction_amount=lots",
        );
        let (status, _) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let strict = ServerConfig::from_env_values(None, Some("true".into()), None).unwrap();
        let request = post("/v1/prepare", URLENCODED, "transfer_amount=lots");
        let (status, _) = send(app(strict), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn envelope_in_snake_case_vocabulary() {
        let body = "originator_naturalPerson_countryOfResidence=US&transaction_originator=0xfrom";
        let request = post("/v1/envelope?vocabulary=snake_case", URLENCODED, body);
        let (status, bytes) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        let originator = &doc["identity"]["originator"];
        assert_eq!(
            originator["originator_persons"][0]["natural_person"]["country_of_residence"],
            json!("US")
        );
        assert_eq!(originator["account_numbers"], json!(["0xfrom"]));

        let request = post("/v1/envelope?vocabulary=camel", URLENCODED, body);
        let (status, _) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn envelope_transport_is_tagged() {
        let request = post(
            "/v1/envelope/transport",
            URLENCODED,
            "transaction_txid=0xabc&transfer_state=pending",
        );
        let (status, bytes) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let form = FormData::from_urlencoded(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert!(form.has("json:identity"));
        assert!(form.has("json:transaction"));
        assert_eq!(form.get("transfer_state"), Some("pending"));

        let decoded = transport::decode_parameters(&form).unwrap();
        assert_eq!(decoded["transaction"]["txid"], json!("0xabc"));
    }

    #[tokio::test]
    async fn decodes_transport_parameters() {
        let request = post(
            "/v1/decode",
            URLENCODED,
            "tag=a&tag=b&json%3Aretry=true",
        );
        let (status, bytes) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc, json!({"tag": ["a", "b"], "retry": true}));
    }

    #[tokio::test]
    async fn lists_choices_with_placeholder() {
        let request = Request::get("/v1/choices/address-type?placeholder=true")
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let res: ChoiceRes = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(res.kind, "address-type");
        assert_eq!(res.choices[0].value, "");
        assert_eq!(res.choices[1].value, "HOME");

        let request = Request::get("/v1/choices/colours").body(Body::empty()).unwrap();
        let (status, _) = send(default_app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
