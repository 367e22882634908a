use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use urlgate_core::ServiceError;

use crate::api::AppState;

/// Admin routes are for staff and superusers only.
pub async fn staff_only(
    State(gate): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let identity = gate.identify(req.headers());
    if identity.is_staff || identity.is_superuser {
        return next.run(req).await;
    }
    ServiceError::PermissionDenied("admin access requires a staff account".into()).into_response()
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::testing::{call, gate_as};
    use urlgate_core::Identity;

    #[tokio::test]
    async fn test_non_staff_refused() {
        for identity in [Identity::anonymous(), Identity::user("u")] {
            let app = build_router(gate_as(identity));
            let (status, body) = call(&app, "GET", "/urls", None).await;
            assert_eq!(status, 403);
            assert_eq!(body["code"], "PERMISSION_DENIED");
        }

        let app = build_router(gate_as(Identity::user("root").superuser()));
        let (status, _) = call(&app, "GET", "/urls", None).await;
        assert_eq!(status, 200);
    }
}
