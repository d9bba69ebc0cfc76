//! JSON API mounted under `/api`.

pub mod activities;
pub mod auth;
pub mod crops;
pub mod farmers;
pub mod fields;
pub mod middleware;
pub mod posts;
pub mod reviews;
pub mod secure_routes;
pub mod weather;

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::{delete, get, post},
    Router,
};

use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// `axum::Json` with rejections reported through [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// PATCH bodies: an absent key stays `None`, an explicit `null` is `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn router() -> Router {
    // Self-registration is the only anonymous write.
    let public_routes = Router::new().route(
        "/farmers/",
        get(farmers::list_farmers).post(farmers::register_farmer),
    );

    let protected_routes = Router::new()
        .route(
            "/farmers/:id/",
            get(farmers::get_farmer)
                .put(farmers::update_farmer)
                .patch(farmers::update_farmer)
                .delete(farmers::delete_farmer),
        )
        .route("/fields/", get(fields::list_fields).post(fields::create_field))
        .route(
            "/fields/:id/",
            get(fields::get_field)
                .put(fields::replace_field)
                .patch(fields::patch_field)
                .delete(fields::delete_field),
        )
        .route("/crops/", get(crops::list_crops).post(crops::create_crop))
        .route(
            "/crops/:id/",
            get(crops::get_crop)
                .put(crops::replace_crop)
                .patch(crops::patch_crop)
                .delete(crops::delete_crop),
        )
        .route(
            "/activities/",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/activities/:id/",
            get(activities::get_activity)
                .put(activities::replace_activity)
                .patch(activities::patch_activity)
                .delete(activities::delete_activity),
        )
        .route(
            "/weather/",
            get(weather::list_weather).post(weather::create_weather),
        )
        .route(
            "/weather/:id/",
            get(weather::get_weather)
                .put(weather::replace_weather)
                .patch(weather::patch_weather)
                .delete(weather::delete_weather),
        )
        .route(
            "/secure-routes/",
            get(secure_routes::list_routes).post(secure_routes::create_route),
        )
        .route(
            "/secure-routes/:id/",
            get(secure_routes::get_route)
                .put(secure_routes::replace_route)
                .patch(secure_routes::patch_route)
                .delete(secure_routes::delete_route),
        )
        .route(
            "/reviews/",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/reviews/eligibility/", get(reviews::eligibility))
        .route(
            "/reviews/:id/",
            get(reviews::get_review)
                .put(reviews::replace_review)
                .patch(reviews::patch_review)
                .delete(reviews::delete_review),
        )
        .route("/posts/", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id/",
            get(posts::get_post)
                .put(posts::replace_post)
                .patch(posts::patch_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like/", post(posts::toggle_like))
        .route("/posts/:id/comments/", post(posts::add_comment))
        .route(
            "/posts/:id/comments/:comment_id/",
            delete(posts::delete_comment),
        )
        .route_layer(axum::middleware::from_fn(middleware::require_actor));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(middleware::token_auth))
}
