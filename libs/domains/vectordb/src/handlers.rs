use axum::{Router, extract::FromRequestParts, extract::State, http::request::Parts, routing::post};
use axum_helpers::{
    ApiResponse, AppError, BearerToken, ValidatedJson,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        TimeoutResponse, UnauthorizedResponse,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::credentials::CredentialStore;
use crate::error::VectorDbResult;
use crate::models::{
    Collection, CollectionDescription, DeleteResult, DistanceMetric, EntityId, EntityRecord,
    InsertResult, Metadata, NewCollection, NewEntity, NewTenant, SearchHit, SearchQuery,
    TenantContext,
};
use crate::repository::VectorStore;
use crate::service::VectorDbService;

pub const API_PREFIX: &str = "/v2/vectordb";
const TAG: &str = "vectordb";

// ===== Request bodies =====

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub user_name: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub pub_key: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DropUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub user_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    #[serde(alias = "collectionName")]
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub dimension: i64,
    #[serde(default)]
    pub metric_type: Option<DistanceMetric>,
    #[serde(default)]
    pub vector_field: Option<String>,
    /// Expected metadata field names
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Body of describe and drop
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionNameRequest {
    #[serde(alias = "collectionName")]
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// One entity to insert.
///
/// Metadata is taken from `metadata`; any other top-level keys are merged
/// into it.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EntityInput {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub vector: Vec<f32>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Metadata,
}

impl From<EntityInput> for NewEntity {
    fn from(input: EntityInput) -> Self {
        let metadata = if input.extra.is_empty() {
            input.metadata
        } else {
            match input.metadata {
                None | Some(serde_json::Value::Null) => Some(input.extra.into()),
                Some(serde_json::Value::Object(mut map)) => {
                    map.extend(input.extra);
                    Some(map.into())
                }
                // Left for the store to reject
                other => other,
            }
        };
        NewEntity {
            id: input.id,
            vector: input.vector,
            metadata,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    pub data: Vec<EntityInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetEntitiesRequest {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    pub ids: Vec<EntityId>,
    /// All metadata when omitted
    #[serde(default)]
    pub output_fields: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntitiesRequest {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    pub ids: Vec<EntityId>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 255))]
    pub collection_name: String,
    /// Query vectors
    pub data: Vec<Vec<f32>>,
    pub limit: i64,
    #[serde(default)]
    pub anns_field: Option<String>,
    #[serde(default)]
    pub output_fields: Vec<String>,
}

/// `data` of operations that return nothing
#[derive(Debug, Serialize, ToSchema)]
pub struct EmptyData {}

// ===== Authentication =====

/// Caller authenticated from the bearer token
pub struct Authenticated(pub TenantContext);

impl<C, S> FromRequestParts<Arc<VectorDbService<C, S>>> for Authenticated
where
    C: CredentialStore + 'static,
    S: VectorStore + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        service: &Arc<VectorDbService<C, S>>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, service).await?;
        let ctx = service.authenticate(&token).await?;
        Ok(Authenticated(ctx))
    }
}

// ===== Router =====

/// OpenAPI documentation for the vector database API
#[derive(OpenApi)]
#[openapi(
    paths(
        create_user,
        list_users,
        drop_user,
        create_collection,
        list_collections,
        describe_collection,
        drop_collection,
        insert_entities,
        get_entities,
        delete_entities,
        search_entities,
    ),
    components(
        schemas(
            CreateUserRequest, DropUserRequest,
            CreateCollectionRequest, CollectionNameRequest,
            EntityInput, InsertRequest, GetEntitiesRequest, DeleteEntitiesRequest, SearchRequest,
            Collection, CollectionDescription, DistanceMetric,
            InsertResult, DeleteResult, EntityRecord, SearchHit, EmptyData
        ),
        responses(
            BadRequestResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            TimeoutResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Multi-tenant vector database")
    )
)]
pub struct VectorDbApiDoc;

/// Every endpoint under `/v2/vectordb`
pub fn router<C, S>(service: VectorDbService<C, S>) -> Router
where
    C: CredentialStore + 'static,
    S: VectorStore + 'static,
{
    let shared_service = Arc::new(service);

    let routes = Router::new()
        .route("/users/create", post(create_user))
        .route("/users/list", post(list_users))
        .route("/users/drop", post(drop_user))
        .route("/collections/create", post(create_collection))
        .route("/collections/list", post(list_collections))
        .route("/collections/describe", post(describe_collection))
        .route("/collections/drop", post(drop_collection))
        .route("/entities/insert", post(insert_entities))
        .route("/entities/get", post(get_entities))
        .route("/entities/delete", post(delete_entities))
        .route("/entities/search", post(search_entities))
        .with_state(shared_service);

    Router::new().nest(API_PREFIX, routes)
}

// ===== Users =====

/// Create a tenant (root only)
#[utoipa::path(
    post,
    path = "/v2/vectordb/users/create",
    tag = TAG,
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = ApiResponse<EmptyData>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> VectorDbResult<ApiResponse<EmptyData>> {
    service
        .create_user(
            &ctx,
            NewTenant {
                name: input.user_name,
                secret: input.password,
                pub_key: input.pub_key,
            },
        )
        .await?;
    Ok(ApiResponse::ok(EmptyData {}))
}

/// List tenant names (root only); any request body is ignored
#[utoipa::path(
    post,
    path = "/v2/vectordb/users/list",
    tag = TAG,
    responses(
        (status = 200, description = "User names, ascending", body = ApiResponse<Vec<String>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
) -> VectorDbResult<ApiResponse<Vec<String>>> {
    let users = service.list_users(&ctx).await?;
    Ok(ApiResponse::ok(users))
}

/// Drop a tenant and everything it owns (root only)
#[utoipa::path(
    post,
    path = "/v2/vectordb/users/drop",
    tag = TAG,
    request_body = DropUserRequest,
    responses(
        (status = 200, description = "User dropped", body = ApiResponse<EmptyData>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn drop_user<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<DropUserRequest>,
) -> VectorDbResult<ApiResponse<EmptyData>> {
    service.drop_user(&ctx, &input.user_name).await?;
    Ok(ApiResponse::ok(EmptyData {}))
}

// ===== Collections =====

/// Create a collection in the caller's namespace
#[utoipa::path(
    post,
    path = "/v2/vectordb/collections/create",
    tag = TAG,
    request_body = CreateCollectionRequest,
    responses(
        (status = 200, description = "Collection created", body = ApiResponse<Collection>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_collection<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<CreateCollectionRequest>,
) -> VectorDbResult<ApiResponse<Collection>> {
    let collection = service
        .create_collection(
            &ctx,
            NewCollection {
                name: input.name,
                dimension: input.dimension,
                metric: input.metric_type,
                vector_field: input.vector_field,
                fields: input.fields,
            },
        )
        .await?;
    Ok(ApiResponse::ok(collection))
}

/// List the caller's collections by name; any request body is ignored
#[utoipa::path(
    post,
    path = "/v2/vectordb/collections/list",
    tag = TAG,
    responses(
        (status = 200, description = "Collections, ascending by name", body = ApiResponse<Vec<Collection>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_collections<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
) -> VectorDbResult<ApiResponse<Vec<Collection>>> {
    let collections = service.list_collections(&ctx).await?;
    Ok(ApiResponse::ok(collections))
}

/// Collection settings and entity count
#[utoipa::path(
    post,
    path = "/v2/vectordb/collections/describe",
    tag = TAG,
    request_body = CollectionNameRequest,
    responses(
        (status = 200, description = "Collection description", body = ApiResponse<CollectionDescription>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn describe_collection<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<CollectionNameRequest>,
) -> VectorDbResult<ApiResponse<CollectionDescription>> {
    let description = service.describe_collection(&ctx, &input.name).await?;
    Ok(ApiResponse::ok(description))
}

/// Drop a collection and its entities
#[utoipa::path(
    post,
    path = "/v2/vectordb/collections/drop",
    tag = TAG,
    request_body = CollectionNameRequest,
    responses(
        (status = 200, description = "Collection dropped", body = ApiResponse<EmptyData>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn drop_collection<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<CollectionNameRequest>,
) -> VectorDbResult<ApiResponse<EmptyData>> {
    service.drop_collection(&ctx, &input.name).await?;
    Ok(ApiResponse::ok(EmptyData {}))
}

// ===== Entities =====

/// Insert or overwrite entities; missing ids are assigned
#[utoipa::path(
    post,
    path = "/v2/vectordb/entities/insert",
    tag = TAG,
    request_body = InsertRequest,
    responses(
        (status = 200, description = "Entities written", body = ApiResponse<InsertResult>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn insert_entities<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<InsertRequest>,
) -> VectorDbResult<ApiResponse<InsertResult>> {
    let batch = input.data.into_iter().map(NewEntity::from).collect();
    let result = service
        .insert(&ctx, &input.collection_name, batch)
        .await?;
    Ok(ApiResponse::ok(result))
}

/// Point reads by id
#[utoipa::path(
    post,
    path = "/v2/vectordb/entities/get",
    tag = TAG,
    request_body = GetEntitiesRequest,
    responses(
        (status = 200, description = "Found entities, ascending by id", body = ApiResponse<Vec<EntityRecord>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_entities<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<GetEntitiesRequest>,
) -> VectorDbResult<ApiResponse<Vec<EntityRecord>>> {
    let entities = service
        .get_entities(&ctx, &input.collection_name, input.ids, input.output_fields)
        .await?;
    Ok(ApiResponse::ok(entities))
}

/// Delete entities by id; unknown ids are ignored
#[utoipa::path(
    post,
    path = "/v2/vectordb/entities/delete",
    tag = TAG,
    request_body = DeleteEntitiesRequest,
    responses(
        (status = 200, description = "Entities removed", body = ApiResponse<DeleteResult>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_entities<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<DeleteEntitiesRequest>,
) -> VectorDbResult<ApiResponse<DeleteResult>> {
    let delete_count = service
        .delete_entities(&ctx, &input.collection_name, input.ids)
        .await?;
    Ok(ApiResponse::ok(DeleteResult { delete_count }))
}

/// Exact top-k search, one hit list per query vector
#[utoipa::path(
    post,
    path = "/v2/vectordb/entities/search",
    tag = TAG,
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ranked hits per query", body = ApiResponse<Vec<Vec<SearchHit>>>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 504, response = TimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_entities<C: CredentialStore, S: VectorStore>(
    State(service): State<Arc<VectorDbService<C, S>>>,
    Authenticated(ctx): Authenticated,
    ValidatedJson(input): ValidatedJson<SearchRequest>,
) -> VectorDbResult<ApiResponse<Vec<Vec<SearchHit>>>> {
    let hits = service
        .search(
            &ctx,
            SearchQuery {
                collection_name: input.collection_name,
                vectors: input.data,
                limit: input.limit,
                anns_field: input.anns_field,
                output_fields: input.output_fields,
            },
        )
        .await?;
    Ok(ApiResponse::ok(hits))
}
