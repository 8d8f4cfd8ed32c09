use axum::{
    async_trait,
    extract::{rejection::PathRejection, FromRef, FromRequest, Path, Request, State},
    routing::{get, post},
    Json, Router,
};
use petstore_types::{Inventory, Pet};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    config::ServerConfig,
    error::{ApiError, Result},
    oauth::OAuthState,
    store::PetStore,
};

/// State shared across all routes
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<PetStore>,
    pub oauth: Arc<OAuthState>,
    pub config: Arc<ServerConfig>,
}

impl FromRef<ServerState> for Arc<OAuthState> {
    fn from_ref(state: &ServerState) -> Self {
        state.oauth.clone()
    }
}

impl FromRef<ServerState> for Arc<PetStore> {
    fn from_ref(state: &ServerState) -> Self {
        state.store.clone()
    }
}

/// Routes that create or replace pets. Protected in the OAuth variant.
pub fn pet_write_routes() -> Router<ServerState> {
    Router::new().route("/pet", post(add_pet).put(update_pet))
}

/// Routes that only read the store. Always public.
pub fn pet_read_routes() -> Router<ServerState> {
    Router::new()
        .route("/pet/:pet_id", get(get_pet_by_id))
        .route("/store/inventory", get(get_inventory))
}

/// JSON pet body, validated against the rules of the running variant.
pub struct PetBody(pub Pet);

#[async_trait]
impl FromRequest<ServerState> for PetBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &ServerState) -> Result<Self> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;

        if state.config.variant.requires_photo_urls()
            && value.get("photoUrls").map_or(true, Value::is_null)
        {
            return Err(ApiError::Validation(
                "missing field `photoUrls`".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map(PetBody)
            .map_err(|e| ApiError::Validation(e.to_string()))
    }
}

async fn add_pet(State(store): State<Arc<PetStore>>, PetBody(pet): PetBody) -> Result<Json<Pet>> {
    tracing::info!(pet_id = pet.id, name = %pet.name, "adding pet");
    let pet = store
        .create(pet)
        .inspect_err(|e| tracing::warn!(error = %e, "add pet rejected"))?;
    Ok(Json(pet))
}

async fn update_pet(
    State(store): State<Arc<PetStore>>,
    PetBody(pet): PetBody,
) -> Result<Json<Pet>> {
    tracing::info!(pet_id = pet.id, "updating pet");
    Ok(Json(store.replace(pet)?))
}

async fn get_pet_by_id(
    State(store): State<Arc<PetStore>>,
    pet_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Pet>> {
    let Path(pet_id) = pet_id?;
    Ok(Json(store.get(pet_id)?))
}

async fn get_inventory(State(store): State<Arc<PetStore>>) -> Json<Inventory> {
    Json(store.inventory())
}
