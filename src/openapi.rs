//! OpenAPI document for the system and items routes, served as JSON and
//! through a Scalar UI.
//!
//! | Path | Content |
//! |------|---------|
//! | `/openapi.json` | the document |
//! | `/docs-json` | the same document |
//! | `/docs` | Scalar UI |

use {
    crate::{
        AppConfig, ErrorResponse, Result,
        api::{
            items::{self, CreateItem, Item, ItemPage, SortField, SortOrder, UpdateItem},
            system::{self, Greeting, HealthStatus, ReadyStatus, ServiceInfo, SystemStatus},
        },
    },
    axum::{Router, routing::get},
    http::header::CONTENT_TYPE,
    utoipa::OpenApi,
    utoipa_scalar::{Scalar, Servable},
};

/// Route of the JSON document.
pub const OPENAPI_JSON_PATH: &str = "/openapi.json";
/// Alias of [`OPENAPI_JSON_PATH`].
pub const OPENAPI_DOCS_JSON_PATH: &str = "/docs-json";
/// Route of the Scalar UI.
pub const OPENAPI_UI_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(description = "Items CRUD behind a hardened HTTP middleware stack."),
    paths(
        system::root,
        system::health,
        system::ready,
        system::info,
        system::system,
        items::create_item,
        items::list_items,
        items::get_item,
        items::update_item,
        items::replace_item,
        items::delete_item,
    ),
    components(schemas(
        Item,
        CreateItem,
        UpdateItem,
        ItemPage,
        SortField,
        SortOrder,
        ErrorResponse,
        Greeting,
        HealthStatus,
        ReadyStatus,
        ServiceInfo,
        SystemStatus,
    )),
    tags(
        (name = "system", description = "Probes and service introspection"),
        (name = "items", description = "Items catalogue"),
    )
)]
pub struct ApiDoc;

/// The document, titled and versioned after the running service.
pub fn document(app: &AppConfig) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = app.name.clone();
    doc.info.version = app.version.clone();
    doc
}

/// Routes serving `doc`.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn docs_routes<S>(doc: utoipa::openapi::OpenApi) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let json = doc.to_pretty_json()?;
    let serve_json = move || {
        let json = json.clone();
        async move { ([(CONTENT_TYPE, "application/json")], json) }
    };

    Ok(Router::new()
        .route(OPENAPI_JSON_PATH, get(serve_json.clone()))
        .route(OPENAPI_DOCS_JSON_PATH, get(serve_json))
        .merge(Scalar::with_url(OPENAPI_UI_PATH, doc)))
}
