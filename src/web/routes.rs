use axum::{
    extract::{Form, Path, Query},
    response::Response,
};
use serde_json::{json, Value};

use super::{
    forms::{self, RouteForm},
    see_other, split_validation, Ctx, PageError,
};
use crate::entities::prelude::SecurityStatus;
use crate::error::ValidationErrors;
use crate::listing::ListParams;
use crate::services::secure_routes;

fn form_data(form: &RouteForm, action: String) -> Value {
    json!({
        "form": form,
        "action": action,
        "status_choices": forms::choices::<SecurityStatus>(&form.security_status),
    })
}

async fn show_form(
    ctx: &Ctx,
    title: &str,
    form: &RouteForm,
    action: String,
    errors: Option<ValidationErrors>,
) -> Result<Response, PageError> {
    let data = form_data(form, action);
    match errors {
        Some(errors) => ctx.render_invalid("route_form", title, errors, data).await,
        None => ctx.render("route_form", title, data).await,
    }
}

pub async fn list(ctx: Ctx, Query(params): Query<ListParams>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let routes = secure_routes::list(&ctx.db, actor, &params).await?;
    ctx.render(
        "route_list",
        "Secure routes",
        json!({"routes": routes, "search": params.search_term()}),
    )
    .await
}

pub async fn detail(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let route = secure_routes::get(&ctx.db, actor, id).await?;
    let geojson = serde_json::to_string_pretty(&route.route_path_geojson)
        .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;
    let title = route.route_name.clone();
    ctx.render(
        "route_detail",
        &title,
        json!({"route": route, "geojson": geojson}),
    )
    .await
}

pub async fn add_page(ctx: Ctx) -> Result<Response, PageError> {
    let form = RouteForm {
        security_status: "green".to_string(),
        ..Default::default()
    };
    show_form(&ctx, "Add route", &form, "/routes/add/".to_string(), None).await
}

pub async fn add(ctx: Ctx, Form(form): Form<RouteForm>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(secure_routes::create(&ctx.db, actor, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(route) => Ok(see_other(format!("/routes/{}/", route.id))),
        Err(errors) => {
            show_form(&ctx, "Add route", &form, "/routes/add/".to_string(), Some(errors)).await
        }
    }
}

pub async fn edit_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let route = secure_routes::get(&ctx.db, actor, id).await?;
    let form = RouteForm::from_model(&route);
    show_form(&ctx, "Edit route", &form, format!("/routes/{}/edit/", id), None).await
}

pub async fn edit(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<RouteForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(secure_routes::update(&ctx.db, actor, id, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(route) => Ok(see_other(format!("/routes/{}/", route.id))),
        Err(errors) => {
            show_form(
                &ctx,
                "Edit route",
                &form,
                format!("/routes/{}/edit/", id),
                Some(errors),
            )
            .await
        }
    }
}

pub async fn delete_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let route = secure_routes::get(&ctx.db, actor, id).await?;
    ctx.render(
        "confirm_delete",
        "Delete route",
        json!({
            "object_name": route.route_name,
            "action": format!("/routes/{}/delete/", id),
            "cancel_url": format!("/routes/{}/", id),
        }),
    )
    .await
}

pub async fn delete(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    secure_routes::delete(&ctx.db, actor, id).await?;
    Ok(see_other("/routes/".to_string()))
}
