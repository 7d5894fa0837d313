use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::shared::config::ServerConfig;
use crate::system::auth::middleware::{require_admin, require_auth, require_salesperson};
use crate::{handlers, system};

/// Application routes. Unmatched paths are served from `static_dir`.
pub fn configure_routes(server: &ServerConfig) -> Router {
    api_routes(server.max_upload_bytes()).fallback_service(ServeDir::new(&server.static_dir))
}

fn api_routes(max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SYSTEM AUTH ROUTES (PUBLIC)
        // ========================================
        .route(
            "/api/system/auth/login",
            post(system::handlers::auth::login),
        )
        .route(
            "/api/system/auth/refresh",
            post(system::handlers::auth::refresh),
        )
        .route(
            "/api/system/auth/logout",
            post(system::handlers::auth::logout),
        )
        .route(
            "/api/system/auth/me",
            get(system::handlers::auth::current_user).layer(middleware::from_fn(require_auth)),
        )
        // System users management (admin only)
        .route(
            "/api/system/users",
            get(system::handlers::users::list_users)
                .post(system::handlers::users::create_user)
                .layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/system/users/:id",
            get(system::handlers::users::get_user)
                .put(system::handlers::users::update_user)
                .delete(system::handlers::users::delete_user)
                .layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/system/users/:id/change-password",
            post(system::handlers::users::change_password)
                .layer(middleware::from_fn(require_auth)),
        )
        // ========================================
        // ADMIN ROUTES
        // ========================================
        .route(
            "/api/admin/upload",
            post(handlers::u501_import_clients::upload)
                .layer(handlers::u501_import_clients::body_limit(max_upload_bytes))
                .layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/dashboard/summary",
            get(handlers::d400_salesperson_summary::get_summary)
                .layer(middleware::from_fn(require_admin)),
        )
        .route(
            "/api/reports/service-tasks",
            get(handlers::u502_export_report::download).layer(middleware::from_fn(require_admin)),
        )
        // ========================================
        // SALESPERSON ROUTES
        // ========================================
        .route(
            "/api/service-tasks/pending",
            get(handlers::a002_service_task::list_pending)
                .layer(middleware::from_fn(require_salesperson)),
        )
        .route(
            "/api/service-tasks/:id",
            patch(handlers::a002_service_task::update_status)
                .layer(middleware::from_fn(require_salesperson)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;
    use crate::system::auth::jwt;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use contracts::system::users::UserRole;
    use tower::ServiceExt;

    fn api_routes() -> Router {
        super::api_routes(ServerConfig::default().max_upload_bytes())
    }

    async fn call(method: Method, uri: &str, token: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).unwrap();
        api_routes().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health() {
        let response = api_routes()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for (method, uri) in [
            (Method::POST, "/api/admin/upload"),
            (Method::GET, "/api/dashboard/summary"),
            (Method::GET, "/api/reports/service-tasks"),
            (Method::GET, "/api/service-tasks/pending"),
            (Method::PATCH, "/api/service-tasks/abc"),
            (Method::GET, "/api/system/auth/me"),
            (Method::GET, "/api/system/users"),
        ] {
            assert_eq!(call(method, uri, None).await, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    /// The only test touching the process-wide connection
    #[tokio::test]
    async fn test_wrong_role_is_unauthorized() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        db::set_connection(conn).unwrap();

        let admin = jwt::generate_access_token("u-admin", "admin", UserRole::Admin)
            .await
            .unwrap();
        let seller = jwt::generate_access_token("u-seller", "DJALMA", UserRole::Vendedor)
            .await
            .unwrap();

        assert_eq!(
            call(Method::GET, "/api/service-tasks/pending", Some(&admin)).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(Method::GET, "/api/dashboard/summary", Some(&seller)).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(Method::GET, "/api/dashboard/summary", Some("not-a-jwt")).await,
            StatusCode::UNAUTHORIZED
        );

        assert_eq!(
            call(Method::GET, "/api/service-tasks/pending", Some(&seller)).await,
            StatusCode::OK
        );
        assert_eq!(
            call(Method::GET, "/api/dashboard/summary", Some(&admin)).await,
            StatusCode::OK
        );
    }
}
