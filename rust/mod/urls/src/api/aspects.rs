use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use urlgate_core::ServiceError;

use crate::api::AppState;
use crate::model::{
    AddGroupRestriction, AddUserRestriction, Redirect, SetRedirect, SetVisibility, SimpleAccess,
    Visibility,
};
use crate::registry::AspectKind;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/aspects", get(list_aspects))
        .route(
            "/urls/{id}/visibility",
            get(get_visibility).put(set_visibility).delete(clear_visibility),
        )
        .route("/urls/{id}/visibility/@unpublish", post(unpublish))
        .route(
            "/urls/{id}/redirect",
            get(get_redirect).put(set_redirect).delete(clear_redirect),
        )
        .route(
            "/urls/{id}/access",
            get(get_access).put(set_access).delete(clear_access),
        )
        .route("/urls/{id}/groups", get(list_groups).post(add_group))
        .route("/urls/{id}/groups/{group_id}", delete(remove_group))
        .route("/urls/{id}/users", get(list_users).post(add_user))
        .route("/urls/{id}/users/{user_id}", delete(remove_user))
}

#[derive(Debug, Serialize)]
struct AspectView {
    kind: AspectKind,
    relation_name: &'static str,
    label: &'static str,
    filter: String,
    lookups: [(&'static str, &'static str); 2],
}

/// Mounted aspects in evaluation order, with their list filter parameters.
async fn list_aspects(State(gate): State<AppState>) -> Json<serde_json::Value> {
    let items: Vec<AspectView> = gate
        .registry()
        .descriptors()
        .iter()
        .map(|d| {
            let f = d.kind.filter();
            AspectView {
                kind: d.kind,
                relation_name: d.relation_name,
                label: d.label,
                filter: f.parameter_name(),
                lookups: f.lookups(),
            }
        })
        .collect();
    Json(serde_json::json!({ "items": items }))
}

fn missing(id: &str, what: &str) -> ServiceError {
    ServiceError::NotFound(format!("urls/{}/{}", id, what))
}

// ── Visibility ──

async fn get_visibility(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Visibility>, ServiceError> {
    gate.service()
        .get_visibility(&id)?
        .map(Json)
        .ok_or_else(|| missing(&id, "visibility"))
}

async fn set_visibility(
    State(gate): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SetVisibility>,
) -> Result<Json<Visibility>, ServiceError> {
    Ok(Json(gate.service().set_visibility(&id, input)?))
}

async fn unpublish(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Visibility>, ServiceError> {
    Ok(Json(gate.service().unpublish(&id)?))
}

async fn clear_visibility(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    gate.service().clear_visibility(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Redirect ──

async fn get_redirect(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Redirect>, ServiceError> {
    gate.service()
        .get_redirect(&id)?
        .map(Json)
        .ok_or_else(|| missing(&id, "redirect"))
}

async fn set_redirect(
    State(gate): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SetRedirect>,
) -> Result<Json<Redirect>, ServiceError> {
    Ok(Json(gate.service().set_redirect(&id, input)?))
}

async fn clear_redirect(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    gate.service().clear_redirect(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Login / staff / superuser ──

async fn get_access(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SimpleAccess>, ServiceError> {
    gate.service()
        .get_simple_access(&id)?
        .map(Json)
        .ok_or_else(|| missing(&id, "access"))
}

async fn set_access(
    State(gate): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SimpleAccess>,
) -> Result<Json<SimpleAccess>, ServiceError> {
    Ok(Json(gate.service().set_simple_access(&id, input)?))
}

async fn clear_access(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    gate.service().clear_simple_access(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Group / user restrictions ──

async fn list_groups(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    gate.service().get_url(&id)?;
    let groups = gate.service().list_group_restrictions(&id)?;
    Ok(Json(serde_json::json!({ "items": groups })))
}

async fn add_group(
    State(gate): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AddGroupRestriction>,
) -> Result<StatusCode, ServiceError> {
    gate.service().add_group_restriction(&id, input)?;
    Ok(StatusCode::CREATED)
}

async fn remove_group(
    State(gate): State<AppState>,
    Path((id, group_id)): Path<(String, String)>,
) -> Result<StatusCode, ServiceError> {
    gate.service().remove_group_restriction(&id, &group_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
    State(gate): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    gate.service().get_url(&id)?;
    let users = gate.service().list_user_restrictions(&id)?;
    Ok(Json(serde_json::json!({ "items": users })))
}

async fn add_user(
    State(gate): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AddUserRestriction>,
) -> Result<StatusCode, ServiceError> {
    gate.service().add_user_restriction(&id, input)?;
    Ok(StatusCode::CREATED)
}

async fn remove_user(
    State(gate): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ServiceError> {
    gate.service().remove_user_restriction(&id, &user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::build_router;
    use crate::api::testing::{admin_gate, call};

    async fn new_url(app: &axum::Router, path: &str) -> String {
        let (_, v) = call(app, "POST", "/urls", Some(json!({ "path": path }))).await;
        v["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_list_aspects_in_mount_order() {
        let app = build_router(admin_gate());
        let (status, body) = call(&app, "GET", "/aspects", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["items"][0]["kind"], "redirect");
        assert_eq!(body["items"][1]["label"], "Published");
        assert_eq!(body["items"][2]["filter"], "has_access");
        assert_eq!(body["items"][4]["relation_name"], "access_users");
    }

    #[tokio::test]
    async fn test_visibility_endpoints() {
        let app = build_router(admin_gate());
        let id = new_url(&app, "/news/").await;

        let (status, _) = call(&app, "GET", &format!("/urls/{id}/visibility"), None).await;
        assert_eq!(status, 404);
        let (status, _) = call(&app, "POST", &format!("/urls/{id}/visibility/@unpublish"), None).await;
        assert_eq!(status, 404);

        let (status, v) = call(
            &app,
            "PUT",
            &format!("/urls/{id}/visibility"),
            Some(json!({ "published": true })),
        )
        .await;
        assert_eq!(status, 200);
        assert!(v["unpublish_on"].is_null());

        let (status, v) = call(&app, "POST", &format!("/urls/{id}/visibility/@unpublish"), None).await;
        assert_eq!(status, 200);
        assert!(!v["unpublish_on"].is_null());

        let (_, view) = call(&app, "GET", &format!("/urls/{id}"), None).await;
        assert_eq!(view["columns"]["Published"], false);

        let (status, _) = call(&app, "DELETE", &format!("/urls/{id}/visibility"), None).await;
        assert_eq!(status, 204);
    }

    #[tokio::test]
    async fn test_redirect_endpoints() {
        let app = build_router(admin_gate());
        let id = new_url(&app, "/docs/").await;

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/urls/{id}/redirect"),
            Some(json!({ "target": "./relative" })),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "VALIDATION_FAILED");

        let (status, r) = call(
            &app,
            "PUT",
            &format!("/urls/{id}/redirect"),
            Some(json!({ "target": "https://example.com/new-docs/" })),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(r["is_permanent"], true);

        let (status, _) = call(&app, "DELETE", &format!("/urls/{id}/redirect"), None).await;
        assert_eq!(status, 204);
        let (status, _) = call(&app, "GET", &format!("/urls/{id}/redirect"), None).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_access_endpoints() {
        let app = build_router(admin_gate());
        let id = new_url(&app, "/team/").await;

        let (status, a) = call(
            &app,
            "PUT",
            &format!("/urls/{id}/access"),
            Some(json!({ "requires_staff": true })),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(a["requires_authenticated"], false);

        let (status, _) = call(&app, "POST", &format!("/urls/{id}/groups"), Some(json!({ "group_id": "editors" }))).await;
        assert_eq!(status, 201);
        let (status, _) = call(&app, "POST", &format!("/urls/{id}/users"), Some(json!({ "user_id": "alice" }))).await;
        assert_eq!(status, 201);

        let (_, groups) = call(&app, "GET", &format!("/urls/{id}/groups"), None).await;
        assert_eq!(groups["items"], json!(["editors"]));

        let (_, view) = call(&app, "GET", &format!("/urls/{id}"), None).await;
        assert_eq!(view["columns"]["Login Restricted"], true);
        assert_eq!(view["columns"]["Group Restricted"], true);
        assert_eq!(view["columns"]["User Restricted"], true);

        let (status, _) = call(&app, "DELETE", &format!("/urls/{id}/users/alice"), None).await;
        assert_eq!(status, 204);
        let (status, _) = call(&app, "DELETE", &format!("/urls/{id}/users/alice"), None).await;
        assert_eq!(status, 404);

        let (status, _) = call(&app, "GET", "/urls/nope/groups", None).await;
        assert_eq!(status, 404);
    }
}
