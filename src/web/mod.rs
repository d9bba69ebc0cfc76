//! Server-rendered pages, authenticated with the signed session cookie.

pub mod accounts;
pub mod activities;
pub mod crops;
pub mod fields;
pub mod forms;
pub mod posts;
pub mod routes;
pub mod session;
pub mod templates;
pub mod weather;

use std::sync::Arc;

use axum::{
    extract::{Extension, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use handlebars::Handlebars;
use sea_orm::{DatabaseConnection, DbErr};
use serde_json::{json, Value};

use crate::auth::Actor;
use crate::error::{AppError, ValidationErrors};
use crate::services::reviews;

/// An error surfaced as an HTML page; anonymous access goes to the login form.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        PageError(err)
    }
}

impl From<DbErr> for PageError {
    fn from(err: DbErr) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let message = match &self.0 {
            AppError::Unauthenticated => {
                return Redirect::to(session::LOGIN_URL).into_response();
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                tracing::Span::current().record("error", tracing::field::display(e));
                "Something went wrong on our side.".to_string()
            }
            AppError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                "Something went wrong on our side.".to_string()
            }
            other => other.to_string(),
        };
        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage { message });
        response
    }
}

/// Left on error responses for [`render_error_pages`] to fill in.
#[derive(Clone, Debug)]
struct ErrorPage {
    message: String,
}

/// Renders the `error` template for responses carrying an [`ErrorPage`].
async fn render_error_pages(
    Extension(templates): Extension<Arc<Handlebars<'static>>>,
    request: Request,
    next: Next,
) -> Response {
    let actor = request.extensions().get::<Actor>().cloned();
    let mut response = next.run(request).await;
    let Some(page) = response.extensions_mut().remove::<ErrorPage>() else {
        return response;
    };

    let status = response.status();
    let data = json!({
        "title": status.canonical_reason().unwrap_or("Error"),
        "code": status.as_u16(),
        "message": page.message,
        "user": actor,
    });
    match templates.render("error", &data) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            (status, page.message).into_response()
        }
    }
}

/// Splits a service result into the form-redisplay case and everything else.
pub fn split_validation<T>(
    result: Result<T, AppError>,
) -> Result<Result<T, ValidationErrors>, PageError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(AppError::Validation(errors)) => Ok(Err(errors)),
        Err(other) => Err(PageError(other)),
    }
}

/// Per-request page context: shared handles plus the signed-in farmer.
pub struct Ctx {
    pub db: DatabaseConnection,
    pub templates: Arc<Handlebars<'static>>,
    pub actor: Option<Actor>,
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let db = parts
            .extensions
            .get::<DatabaseConnection>()
            .cloned()
            .ok_or_else(|| AppError::Internal("database extension missing".to_string()))?;
        let templates = parts
            .extensions
            .get::<Arc<Handlebars<'static>>>()
            .cloned()
            .ok_or_else(|| AppError::Internal("template registry missing".to_string()))?;
        let actor = parts.extensions.get::<Actor>().cloned();
        Ok(Self {
            db,
            templates,
            actor,
        })
    }
}

impl Ctx {
    pub fn actor(&self) -> Result<&Actor, PageError> {
        self.actor
            .as_ref()
            .ok_or(PageError(AppError::Unauthenticated))
    }

    pub async fn render(&self, template: &str, title: &str, data: Value) -> Result<Response, PageError> {
        self.render_status(StatusCode::OK, template, title, data).await
    }

    /// Renders `template` with the layout keys (`title`, `user`,
    /// `show_review_modal`) merged into `data`.
    pub async fn render_status(
        &self,
        status: StatusCode,
        template: &str,
        title: &str,
        mut data: Value,
    ) -> Result<Response, PageError> {
        let show_review_modal = match &self.actor {
            Some(actor) => reviews::can_review(&self.db, actor, chrono::Utc::now().naive_utc()).await?,
            None => false,
        };
        if let Some(object) = data.as_object_mut() {
            object.insert("title".to_string(), json!(title));
            object.insert("user".to_string(), json!(self.actor));
            object.insert("show_review_modal".to_string(), json!(show_review_modal));
        }
        let body = self
            .templates
            .render(template, &data)
            .map_err(|e| AppError::Internal(format!("template {template}: {e}")))?;
        Ok((status, Html(body)).into_response())
    }

    /// Re-displays a rejected form with its messages.
    pub async fn render_invalid(
        &self,
        template: &str,
        title: &str,
        errors: ValidationErrors,
        mut data: Value,
    ) -> Result<Response, PageError> {
        if let Some(object) = data.as_object_mut() {
            object.insert("errors".to_string(), json!(errors));
        }
        self.render_status(StatusCode::BAD_REQUEST, template, title, data)
            .await
    }
}

pub fn see_other(path: String) -> Response {
    Redirect::to(&path).into_response()
}

pub fn router() -> Router {
    // Pages anyone may open.
    let public_routes = Router::new()
        .route("/", get(accounts::index))
        .route(
            "/registration/",
            get(accounts::registration_page).post(accounts::register),
        )
        .route(
            "/accounts/login/",
            get(accounts::login_page).post(accounts::login),
        )
        .route("/accounts/logout/", post(accounts::logout));

    let protected_routes = Router::new()
        .route("/profiles/", get(accounts::profile))
        .route(
            "/profiles/edit/",
            get(accounts::edit_profile_page).post(accounts::edit_profile),
        )
        .route(
            "/reviews/submit/",
            get(accounts::review_page).post(accounts::submit_review),
        )
        .route("/fields/", get(fields::list))
        .route("/fields/add/", get(fields::add_page).post(fields::add))
        .route("/fields/:id/", get(fields::detail))
        .route("/fields/:id/edit/", get(fields::edit_page).post(fields::edit))
        .route("/fields/:id/delete/", get(fields::delete_page).post(fields::delete))
        .route("/crops/", get(crops::list))
        .route("/crops/add/", get(crops::add_page).post(crops::add))
        .route("/crops/:id/", get(crops::detail))
        .route("/crops/:id/edit/", get(crops::edit_page).post(crops::edit))
        .route("/crops/:id/delete/", get(crops::delete_page).post(crops::delete))
        .route("/activities/", get(activities::list))
        .route("/activities/add/", get(activities::add_page).post(activities::add))
        .route("/activities/:id/", get(activities::detail))
        .route(
            "/activities/:id/edit/",
            get(activities::edit_page).post(activities::edit),
        )
        .route(
            "/activities/:id/delete/",
            get(activities::delete_page).post(activities::delete),
        )
        .route("/weathers/", get(weather::list))
        .route("/weathers/add/", get(weather::add_page).post(weather::add))
        .route("/weathers/:id/", get(weather::detail))
        .route("/weathers/:id/edit/", get(weather::edit_page).post(weather::edit))
        .route(
            "/weathers/:id/delete/",
            get(weather::delete_page).post(weather::delete),
        )
        .route("/routes/", get(routes::list))
        .route("/routes/add/", get(routes::add_page).post(routes::add))
        .route("/routes/:id/", get(routes::detail))
        .route("/routes/:id/edit/", get(routes::edit_page).post(routes::edit))
        .route("/routes/:id/delete/", get(routes::delete_page).post(routes::delete))
        .route("/post/", get(posts::list))
        .route("/post/add/", get(posts::add_page).post(posts::add))
        .route("/post/:id/", get(posts::detail))
        .route("/post/:id/edit/", get(posts::edit_page).post(posts::edit))
        .route("/post/:id/delete/", get(posts::delete_page).post(posts::delete))
        .route("/post/:id/comment/", post(posts::comment))
        .route("/post/:id/like/", post(posts::like))
        .route_layer(axum::middleware::from_fn(session::login_required));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(render_error_pages))
        .layer(axum::middleware::from_fn(session::session_auth))
}
