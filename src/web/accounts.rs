use axum::{
    extract::{Extension, Form, Query},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;
use tower_cookies::{Cookies, Key};

use super::{forms, session, split_validation, Ctx, PageError};
use crate::listing::ListParams;
use crate::services::{activities, crops, farmers, fields, reviews};

pub async fn index(ctx: Ctx) -> Result<Response, PageError> {
    let Some(actor) = ctx.actor.as_ref() else {
        return ctx.render("index", "Welcome", json!({})).await;
    };
    let params = ListParams::default();
    let field_count = fields::list(&ctx.db, actor, &params).await?.len();
    let crop_count = crops::list(&ctx.db, actor, &params).await?.len();
    let today = chrono::Utc::now().date_naive();
    let upcoming: Vec<_> = activities::list(&ctx.db, actor, &params)
        .await?
        .into_iter()
        .filter(|a| a.scheduled_date >= today)
        .take(5)
        .collect();

    ctx.render(
        "index",
        "Dashboard",
        json!({
            "field_count": field_count,
            "crop_count": crop_count,
            "upcoming": upcoming,
        }),
    )
    .await
}

pub async fn registration_page(ctx: Ctx) -> Result<Response, PageError> {
    ctx.render(
        "registration",
        "Sign up",
        json!({"form": forms::RegistrationForm::default()}),
    )
    .await
}

pub async fn register(
    ctx: Ctx,
    Form(form): Form<forms::RegistrationForm>,
) -> Result<Response, PageError> {
    let outcome = match form.clean() {
        Ok(input) => split_validation(farmers::register(&ctx.db, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(_) => Ok(super::see_other(session::LOGIN_URL.to_string())),
        Err(errors) => {
            ctx.render_invalid(
                "registration",
                "Sign up",
                errors,
                json!({"form": form.redacted()}),
            )
            .await
        }
    }
}

#[derive(Deserialize)]
pub struct NextParam {
    next: Option<String>,
}

pub async fn login_page(
    ctx: Ctx,
    Query(params): Query<NextParam>,
) -> Result<Response, PageError> {
    ctx.render(
        "login",
        "Log in",
        json!({
            "form": forms::LoginForm::default(),
            "next": session::encode_component(session::safe_next(params.next.as_deref())),
        }),
    )
    .await
}

pub async fn login(
    ctx: Ctx,
    cookies: Cookies,
    Extension(key): Extension<Key>,
    Query(params): Query<NextParam>,
    Form(form): Form<forms::LoginForm>,
) -> Result<Response, PageError> {
    let next = session::safe_next(params.next.as_deref()).to_string();
    match split_validation(farmers::authenticate(&ctx.db, &form.username, &form.password).await)? {
        Ok(farmer) => {
            session::start_session(&cookies, &key, farmer.id);
            Ok(super::see_other(next))
        }
        Err(errors) => {
            let form = forms::LoginForm {
                password: String::new(),
                ..form
            };
            let data = json!({"form": form, "next": session::encode_component(&next)});
            ctx.render_invalid("login", "Log in", errors, data).await
        }
    }
}

pub async fn logout(cookies: Cookies, Extension(key): Extension<Key>) -> Response {
    session::end_session(&cookies, &key);
    super::see_other("/".to_string())
}

pub async fn profile(ctx: Ctx) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let farmer = farmers::get(&ctx.db, actor, actor.id).await?;
    let group = farmer.verification_status.group_name();
    ctx.render(
        "profile",
        "My profile",
        json!({"farmer_profile": farmer, "group": group}),
    )
    .await
}

pub async fn edit_profile_page(ctx: Ctx) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let farmer = farmers::get(&ctx.db, actor, actor.id).await?;
    ctx.render(
        "profile_form",
        "Edit profile",
        json!({"form": forms::ProfileForm::from_model(&farmer)}),
    )
    .await
}

pub async fn edit_profile(
    ctx: Ctx,
    Form(form): Form<forms::ProfileForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => {
            split_validation(farmers::update_profile(&ctx.db, actor, actor.id, input).await)?
        }
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(_) => Ok(super::see_other("/profiles/".to_string())),
        Err(errors) => {
            ctx.render_invalid("profile_form", "Edit profile", errors, json!({"form": form}))
                .await
        }
    }
}

pub async fn review_page(ctx: Ctx) -> Result<Response, PageError> {
    ctx.render(
        "review_form",
        "Leave a review",
        json!({"form": forms::ReviewForm::default()}),
    )
    .await
}

pub async fn submit_review(
    ctx: Ctx,
    Form(form): Form<forms::ReviewForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(reviews::create(&ctx.db, actor, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(_) => Ok(super::see_other("/".to_string())),
        Err(errors) => {
            ctx.render_invalid(
                "review_form",
                "Leave a review",
                errors,
                json!({"form": form}),
            )
            .await
        }
    }
}
