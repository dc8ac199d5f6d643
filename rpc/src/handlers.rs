//! RPC request handlers and their wire types.

use crate::error::RpcError;
use crate::evaluate::{assemble_input, EvaluateRequest};
use crate::server::{AppState, CoreStore};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use praman_evaluation::{evaluate, EvaluationReport};
use praman_orchestrator::{FlowType, StartedFlow};
use praman_registry::{EntitySummary, NewEntity, NewIdentity, NewInvoice};
use praman_store::{
    AuditRecord, ComplianceRecord, EntityRecord, InvoiceRecord, LineItem, ProfileRecord,
};
use praman_types::{
    ChannelKey, EntityId, EntityType, IdentityId, InvoiceStatus, TaxId, Timestamp,
};
use serde::{Deserialize, Serialize};

fn parse_identity(raw: &str) -> Result<IdentityId, RpcError> {
    IdentityId::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

fn parse_entity(raw: &str) -> Result<EntityId, RpcError> {
    EntityId::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

// ── Issuance flows ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IdentityChallengeRequest {
    pub channel_value: String,
}

#[derive(Deserialize)]
pub struct IdentityVerifyRequest {
    pub channel_value: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct CreateIdentityRequest {
    pub name: String,
    pub channel_value: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct VerifiedResponse {
    pub verified: bool,
}

pub async fn identity_challenge<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<IdentityChallengeRequest>,
) -> Result<Json<StartedFlow>, RpcError> {
    let channel = ChannelKey::phone(req.channel_value);
    let started = state
        .orchestrator
        .start_flow(FlowType::Identity, &channel, Timestamp::now());
    state.metrics.challenges_issued.inc();
    Ok(Json(started))
}

pub async fn identity_verify<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<IdentityVerifyRequest>,
) -> Result<Json<VerifiedResponse>, RpcError> {
    let channel = ChannelKey::phone(req.channel_value);
    state
        .orchestrator
        .submit_code(&channel, &req.code, Timestamp::now())?;
    Ok(Json(VerifiedResponse { verified: true }))
}

pub async fn create_identity<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<CreateIdentityRequest>,
) -> Result<Json<ProfileRecord>, RpcError> {
    let profile = state.orchestrator.commit_identity(
        &NewIdentity {
            name: req.name,
            channel_value: req.channel_value,
            email: req.email,
            address: req.address,
        },
        Timestamp::now(),
    )?;
    state.metrics.identities_created.inc();
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct TaxChallengeRequest {
    pub identity_id: String,
}

#[derive(Deserialize)]
pub struct TaxVerifyRequest {
    pub identity_id: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct IssueTaxRequest {
    pub identity_id: String,
}

#[derive(Serialize)]
pub struct TaxIdResponse {
    pub tax_id: TaxId,
    pub identity_id: IdentityId,
}

pub async fn tax_challenge<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<TaxChallengeRequest>,
) -> Result<Json<StartedFlow>, RpcError> {
    let identity = parse_identity(&req.identity_id)?;
    let channel = state
        .orchestrator
        .registry()
        .lookup_identity(&identity)?
        .channel;
    let started = state
        .orchestrator
        .start_flow(FlowType::TaxIdentifier, &channel, Timestamp::now());
    state.metrics.challenges_issued.inc();
    Ok(Json(started))
}

pub async fn tax_verify<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<TaxVerifyRequest>,
) -> Result<Json<VerifiedResponse>, RpcError> {
    let identity = parse_identity(&req.identity_id)?;
    let channel = state
        .orchestrator
        .registry()
        .lookup_identity(&identity)?
        .channel;
    state
        .orchestrator
        .submit_code(&channel, &req.code, Timestamp::now())?;
    Ok(Json(VerifiedResponse { verified: true }))
}

pub async fn issue_tax_id<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<IssueTaxRequest>,
) -> Result<Json<TaxIdResponse>, RpcError> {
    let identity = parse_identity(&req.identity_id)?;
    let record = state
        .orchestrator
        .commit_tax_identifier(&identity, Timestamp::now())?;
    state.metrics.tax_ids_issued.inc();
    Ok(Json(TaxIdResponse {
        tax_id: record.id,
        identity_id: record.identity,
    }))
}

#[derive(Deserialize)]
pub struct EntityChallengeRequest {
    pub primary_owner: String,
}

#[derive(Deserialize)]
pub struct EntityVerifyRequest {
    pub primary_owner: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct RegisterEntityRequest {
    pub name: String,
    pub entity_type: EntityType,
    pub region_code: String,
    pub owners: Vec<String>,
    pub address: Option<String>,
}

pub async fn entity_challenge<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<EntityChallengeRequest>,
) -> Result<Json<StartedFlow>, RpcError> {
    let owner = parse_identity(&req.primary_owner)?;
    let channel = state
        .orchestrator
        .registry()
        .lookup_identity(&owner)?
        .channel;
    let started = state
        .orchestrator
        .start_flow(FlowType::Entity, &channel, Timestamp::now());
    state.metrics.challenges_issued.inc();
    Ok(Json(started))
}

pub async fn entity_verify<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<EntityVerifyRequest>,
) -> Result<Json<VerifiedResponse>, RpcError> {
    let owner = parse_identity(&req.primary_owner)?;
    let channel = state
        .orchestrator
        .registry()
        .lookup_identity(&owner)?
        .channel;
    state
        .orchestrator
        .submit_code(&channel, &req.code, Timestamp::now())?;
    Ok(Json(VerifiedResponse { verified: true }))
}

pub async fn register_entity<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<RegisterEntityRequest>,
) -> Result<Json<EntityRecord>, RpcError> {
    let owners = req
        .owners
        .iter()
        .map(|raw| parse_identity(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let record = state.orchestrator.commit_entity(
        &NewEntity {
            name: req.name,
            entity_type: req.entity_type,
            address: req.address,
            region_code: req.region_code,
            owners,
        },
        Timestamp::now(),
    )?;
    state.metrics.entities_registered.inc();
    Ok(Json(record))
}

// ── Lookups ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub linkable_only: bool,
}

pub async fn lookup_identity<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileRecord>, RpcError> {
    let id = parse_identity(&id)?;
    Ok(Json(state.orchestrator.registry().lookup_identity(&id)?))
}

pub async fn search_identities<S: CoreStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProfileRecord>>, RpcError> {
    Ok(Json(
        state
            .orchestrator
            .registry()
            .search_identity(&query.q, query.linkable_only)?,
    ))
}

pub async fn lookup_entity<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<EntityRecord>, RpcError> {
    let id = parse_entity(&id)?;
    Ok(Json(state.orchestrator.registry().lookup_entity(&id)?))
}

pub async fn entity_summary<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<EntitySummary>, RpcError> {
    let id = parse_entity(&id)?;
    Ok(Json(state.orchestrator.registry().entity_summary(&id)?))
}

pub async fn search_entities<S: CoreStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<EntityRecord>>, RpcError> {
    Ok(Json(state.orchestrator.registry().search_entity(&query.q)?))
}

// ── Administrative toggles ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BlacklistRequest {
    pub blacklisted: bool,
}

#[derive(Deserialize)]
pub struct SuspensionRequest {
    pub suspended: bool,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub async fn set_blacklist<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<BlacklistRequest>,
) -> Result<Json<OkResponse>, RpcError> {
    let id = parse_identity(&id)?;
    state
        .orchestrator
        .registry()
        .set_blacklist(&id, req.blacklisted, Timestamp::now())?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn set_suspension<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<SuspensionRequest>,
) -> Result<Json<OkResponse>, RpcError> {
    let id = parse_entity(&id)?;
    state
        .orchestrator
        .registry()
        .set_entity_suspended(&id, req.suspended, Timestamp::now())?;
    Ok(Json(OkResponse { ok: true }))
}

// ── Invoices and compliance ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RecordInvoiceRequest {
    pub counterparty: String,
    pub ref_number: String,
    pub date_secs: u64,
    pub line_items: Vec<LineItem>,
}

#[derive(Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Deserialize)]
pub struct ComplianceRequest {
    pub score: u32,
}

pub async fn record_invoice<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<RecordInvoiceRequest>,
) -> Result<Json<InvoiceRecord>, RpcError> {
    let entity = parse_entity(&id)?;
    let counterparty = parse_entity(&req.counterparty)?;
    let record = state.orchestrator.registry().record_invoice(
        &NewInvoice {
            entity,
            counterparty,
            ref_number: req.ref_number,
            date: Timestamp::new(req.date_secs),
            line_items: req.line_items,
        },
        Timestamp::now(),
    )?;
    state.metrics.invoices_recorded.inc();
    Ok(Json(record))
}

pub async fn list_invoices<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InvoiceRecord>>, RpcError> {
    let entity = parse_entity(&id)?;
    Ok(Json(state.orchestrator.registry().list_invoices(&entity)?))
}

pub async fn update_invoice_status<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<InvoiceStatusRequest>,
) -> Result<Json<InvoiceRecord>, RpcError> {
    Ok(Json(state.orchestrator.registry().update_invoice_status(
        &id,
        req.status,
        Timestamp::now(),
    )?))
}

pub async fn file_compliance<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<ComplianceRequest>,
) -> Result<Json<ComplianceRecord>, RpcError> {
    let entity = parse_entity(&id)?;
    Ok(Json(state.orchestrator.registry().file_compliance_record(
        &entity,
        req.score,
        Timestamp::now(),
    )?))
}

pub async fn compliance_history<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ComplianceRecord>>, RpcError> {
    let entity = parse_entity(&id)?;
    Ok(Json(
        state.orchestrator.registry().compliance_history(&entity)?,
    ))
}

// ── Consumers and evaluation ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MintConsumerRequest {
    pub name: String,
}

pub async fn mint_consumer<S: CoreStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<MintConsumerRequest>,
) -> Result<Json<praman_credential::MintedCredential>, RpcError> {
    Ok(Json(state.credentials.mint(&req.name, Timestamp::now())?))
}

pub async fn rotate_consumer<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Result<Json<praman_credential::MintedCredential>, RpcError> {
    Ok(Json(state.credentials.rotate(&name, Timestamp::now())?))
}

pub async fn revoke_consumer<S: CoreStore>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> Result<Json<OkResponse>, RpcError> {
    state.credentials.revoke(&name)?;
    Ok(Json(OkResponse { ok: true }))
}

/// The signed evaluation endpoint. Authentication runs over the raw body
/// before any JSON parsing happens.
pub async fn evaluate_subject<S: CoreStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EvaluationReport>, RpcError> {
    let now = Timestamp::now();
    let api_key = required_header(&headers, "x-api-key")?;
    let signature = required_header(&headers, "x-signature")?;
    let timestamp: u64 = required_header(&headers, "x-timestamp")?
        .parse()
        .map_err(|_| RpcError::InvalidRequest("malformed X-TIMESTAMP header".into()))?;

    let consumer = state
        .credentials
        .verify_request(&api_key, timestamp, &signature, &body, now)
        .map_err(|err| {
            state.metrics.unauthorized_requests.inc();
            err
        })?;

    let req: EvaluateRequest = serde_json::from_slice(&body)
        .map_err(|e| RpcError::InvalidRequest(format!("invalid request body: {e}")))?;
    let input = assemble_input(state.orchestrator.registry(), &req, now)?;
    let report = evaluate(&input);
    state.metrics.evaluations_served.inc();
    tracing::info!(
        consumer = %consumer,
        score = report.composite_score,
        verified = report.verified,
        "evaluation served"
    );
    Ok(Json(report))
}

fn required_header(headers: &HeaderMap, name: &str) -> Result<String, RpcError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| RpcError::InvalidRequest(format!("missing {name} header")))
}

// ── Audit and health ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

pub async fn recent_audit<S: CoreStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, RpcError> {
    let limit = query.limit.unwrap_or(100).min(1000);
    Ok(Json(state.orchestrator.registry().recent_audit(limit)?))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn metrics<S: CoreStore>(State(state): State<AppState<S>>) -> String {
    state.metrics.render()
}
