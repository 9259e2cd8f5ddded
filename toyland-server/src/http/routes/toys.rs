//! Toy routes
//!
//! One store call per request, result passed straight back. Nothing here
//! checks that a toy exists or that its fields make sense.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use bson::oid::ObjectId;
use bson::Document;
use serde::Deserialize;
use serde_json::Value;

use crate::http::error::ApiResult;
use crate::http::extractors::ToyFields;
use crate::models::{
    document_to_json, page_skip, parse_page, stamp_created_at, TotalToys, PAGE_SIZE, RECENT_LIMIT,
    SEARCH_LIMIT,
};
use crate::state::AppState;
use crate::store::{DeleteAck, InsertAck, ToyFilter, ToyQuery, UpdateAck};

fn render(toys: Vec<Document>) -> Json<Vec<Value>> {
    Json(toys.iter().map(document_to_json).collect())
}

/// GET /all-toys - latest toys first
async fn list_recent(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let query = ToyQuery::new(ToyFilter::All)
        .newest_first()
        .limit(RECENT_LIMIT);
    Ok(render(state.store().find(query).await?))
}

/// GET /toy/{id}
async fn get_toy(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let id = ObjectId::parse_str(&id)?;
    let toy = state.store().find_by_id(id).await?;
    Ok(Json(toy.as_ref().map_or(Value::Null, document_to_json)))
}

/// GET /toys-by-subCategory/{text}
async fn list_by_subcategory(
    State(state): State<AppState>,
    Path(text): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let query = ToyQuery::new(ToyFilter::Subcategory(text));
    Ok(render(state.store().find(query).await?))
}

/// GET /pagination-by-subCategory/{text}/{page}
async fn paginate_by_subcategory(
    State(state): State<AppState>,
    Path((text, page)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Value>>> {
    let skip = page_skip(parse_page(&page));
    let query = ToyQuery::new(ToyFilter::Subcategory(text))
        .skip(skip)
        .limit(PAGE_SIZE);
    Ok(render(state.store().find(query).await?))
}

/// GET /toysByName/{searchText}
///
/// The search text is used as a regex verbatim, so `.` or `(` in it act as
/// pattern syntax.
async fn search_by_name(
    State(state): State<AppState>,
    Path(search_text): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let query = ToyQuery::new(ToyFilter::NameMatches(search_text)).limit(SEARCH_LIMIT);
    Ok(render(state.store().find(query).await?))
}

#[derive(Debug, Deserialize)]
struct MineParams {
    email: Option<String>,
}

/// GET /my-toy?email=
///
/// Without `email` the filter is `sellerEmail: null`.
async fn list_mine(
    State(state): State<AppState>,
    Query(params): Query<MineParams>,
) -> ApiResult<Json<Vec<Value>>> {
    let query = ToyQuery::new(ToyFilter::SellerEmail(params.email));
    Ok(render(state.store().find(query).await?))
}

/// POST /add-toy
async fn create_toy(
    State(state): State<AppState>,
    ToyFields(mut toy): ToyFields,
) -> ApiResult<Json<InsertAck>> {
    stamp_created_at(&mut toy);
    Ok(Json(state.store().insert_one(toy).await?))
}

/// PATCH /update-toy/{id}
async fn update_toy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ToyFields(fields): ToyFields,
) -> ApiResult<Json<UpdateAck>> {
    tracing::debug!(%id, ?fields, "update-toy");
    let id = ObjectId::parse_str(&id)?;
    Ok(Json(state.store().update_one(id, fields).await?))
}

/// DELETE /delete-toy/{id}
async fn delete_toy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteAck>> {
    let id = ObjectId::parse_str(&id)?;
    Ok(Json(state.store().delete_one(id).await?))
}

/// GET /totalToys
async fn total_toys(State(state): State<AppState>) -> ApiResult<Json<TotalToys>> {
    let total_toys = state.store().estimated_count().await?;
    Ok(Json(TotalToys { total_toys }))
}

/// Leading literal segment of every toy route.
pub const ROUTE_SEGMENTS: [&str; 10] = [
    "all-toys",
    "toy",
    "toys-by-subCategory",
    "pagination-by-subCategory",
    "toysByName",
    "my-toy",
    "add-toy",
    "update-toy",
    "delete-toy",
    "totalToys",
];

/// Toy routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all-toys", get(list_recent))
        .route("/toy/{id}", get(get_toy))
        .route("/toys-by-subCategory/{text}", get(list_by_subcategory))
        .route(
            "/pagination-by-subCategory/{text}/{page}",
            get(paginate_by_subcategory),
        )
        .route("/toysByName/{search_text}", get(search_by_name))
        .route("/my-toy", get(list_mine))
        .route("/add-toy", post(create_toy))
        .route("/update-toy/{id}", patch(update_toy))
        .route("/delete-toy/{id}", delete(delete_toy))
        .route("/totalToys", get(total_toys))
}
