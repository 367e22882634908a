use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use urlgate_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::middleware::UrlGate;
use crate::model::{CreateUrl, UpdateUrl, UrlNode};
use crate::resolver::Resolution;
use crate::service::UrlError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/urls", get(list_urls).post(create_url))
        .route("/urls/@resolve", get(resolve))
        .route("/urls/{id}", get(get_url).put(update_url).delete(delete_url))
        .route("/urls/{id}/ancestors", get(list_ancestors))
        .route("/urls/{id}/children", get(list_children))
        .route("/urls/{id}/descendants", get(list_descendants))
        .route("/urls/{id}/siblings", get(list_siblings))
}

/// A URL as the admin API shows it: the node plus its computed tree
/// fields and the display column of every mounted aspect.
#[derive(Debug, Serialize)]
pub struct UrlView {
    #[serde(flatten)]
    pub node: UrlNode,
    pub root: bool,
    pub child: bool,
    pub ancestors: usize,
    pub descendants: usize,
    pub columns: BTreeMap<&'static str, bool>,
}

fn views(gate: &UrlGate, mut nodes: Vec<UrlNode>) -> Result<Vec<UrlView>, UrlError> {
    let svc = gate.service();
    let registry = gate.registry();
    svc.load_aspects(&mut nodes, &registry.kinds())?;

    nodes
        .into_iter()
        .map(|node| {
            Ok(UrlView {
                root: node.is_root(),
                child: node.is_child_node(),
                ancestors: svc.get_ancestor_count(&node)?,
                descendants: svc.get_descendant_count(&node)?,
                columns: registry.display_columns(&node).into_iter().collect(),
                node,
            })
        })
        .collect()
}

fn view(gate: &UrlGate, node: UrlNode) -> Result<UrlView, UrlError> {
    views(gate, vec![node])?
        .pop()
        .ok_or_else(|| UrlError::Internal("empty view".into()))
}

async fn list_urls(
    State(gate): State<AppState>,
    Query(params): Query<ListParams>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<ListResult<UrlView>>, ServiceError> {
    let mut filters = Vec::new();
    for f in gate.registry().filters() {
        let name = f.parameter_name();
        if let Some(value) = raw.get(&name) {
            let yes = f.parse(value).ok_or_else(|| {
                ServiceError::Validation(format!("invalid value for {}: {}", name, value))
            })?;
            filters.push((f.kind, yes));
        }
    }

    let site = raw.get("site").map(String::as_str).unwrap_or(gate.site());
    let result = gate
        .service()
        .list_urls(site, &params, &filters)
        .map_err(ServiceError::from)?;
    let items = views(&gate, result.items).map_err(ServiceError::from)?;
    Ok(Json(ListResult {
        items,
        total: result.total,
    }))
}

async fn create_url(
    State(gate): State<AppState>,
    Json(input): Json<CreateUrl>,
) -> Result<(StatusCode, Json<UrlView>), ServiceError> {
    let node = gate.service().create_url(input).map_err(ServiceError::from)?;
    Ok((StatusCode::CREATED, Json(view(&gate, node)?)))
}

async fn get_url(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UrlView>, ServiceError> {
    let node = gate.service().get_url(&id).map_err(ServiceError::from)?;
    Ok(Json(view(&gate, node)?))
}

async fn update_url(
    State(gate): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUrl>,
) -> Result<Json<UrlView>, ServiceError> {
    let node = gate.service().update_url(&id, input).map_err(ServiceError::from)?;
    Ok(Json(view(&gate, node)?))
}

async fn delete_url(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    gate.service().delete_url(&id).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

fn related(
    gate: &UrlGate,
    id: &str,
    fetch: impl Fn(&UrlNode) -> Result<Vec<UrlNode>, UrlError>,
) -> Result<Json<ListResult<UrlView>>, ServiceError> {
    let node = gate.service().get_url(id)?;
    let items = views(gate, fetch(&node)?)?;
    Ok(Json(ListResult {
        total: items.len(),
        items,
    }))
}

async fn list_ancestors(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListResult<UrlView>>, ServiceError> {
    related(&gate, &id, |n| gate.service().get_ancestors(n, false))
}

async fn list_children(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListResult<UrlView>>, ServiceError> {
    related(&gate, &id, |n| gate.service().get_children(n))
}

async fn list_descendants(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListResult<UrlView>>, ServiceError> {
    related(&gate, &id, |n| gate.service().get_descendants(n))
}

async fn list_siblings(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListResult<UrlView>>, ServiceError> {
    related(&gate, &id, |n| gate.service().get_siblings(n))
}

#[derive(Debug, Deserialize)]
struct ResolveQuery {
    path: String,
}

#[derive(Debug, Serialize)]
struct ResolveView {
    path: String,
    /// False when the gate leaves this path alone.
    applies: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<Resolution>,
}

async fn resolve(
    State(gate): State<AppState>,
    Query(q): Query<ResolveQuery>,
) -> Result<Json<ResolveView>, ServiceError> {
    let resolution = gate.resolve(&q.path).map_err(ServiceError::from)?;
    Ok(Json(ResolveView {
        path: q.path,
        applies: resolution.is_some(),
        resolution,
    }))
}
