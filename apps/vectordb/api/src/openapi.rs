use domain_vectordb::VectorDbApiDoc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "VectorDB API",
        version = "0.1.0",
        description = "Multi-tenant vector storage with exact nearest-neighbour search"
    )
)]
struct ServerDoc;

/// Server document with the vector database paths merged in.
///
/// The domain paths already carry the `/v2/vectordb` prefix, so they are
/// merged rather than nested.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = ServerDoc::openapi();
        doc.merge(VectorDbApiDoc::openapi());
        doc
    }
}
