use axum::{
    extract::{Form, Path, Query},
    response::Response,
};
use serde_json::json;

use super::{forms::FieldForm, see_other, split_validation, Ctx, PageError};
use crate::listing::ListParams;
use crate::services::{activities, crops, fields};

pub async fn list(ctx: Ctx, Query(params): Query<ListParams>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let fields = fields::list(&ctx.db, actor, &params).await?;
    ctx.render(
        "field_list",
        "My fields",
        json!({"fields": fields, "search": params.search_term()}),
    )
    .await
}

pub async fn detail(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let field = fields::get(&ctx.db, actor, id).await?;

    let params = ListParams::default();
    let crops: Vec<_> = crops::list(&ctx.db, actor, &params)
        .await?
        .into_iter()
        .filter(|(crop, _)| crop.field_id == field.id)
        .map(|(crop, _)| crop)
        .collect();
    let activities: Vec<_> = activities::list(&ctx.db, actor, &params)
        .await?
        .into_iter()
        .filter(|a| a.field_id == Some(field.id))
        .collect();

    let title = field.name.clone();
    ctx.render(
        "field_detail",
        &title,
        json!({"field": field, "crops": crops, "activities": activities}),
    )
    .await
}

pub async fn add_page(ctx: Ctx) -> Result<Response, PageError> {
    ctx.render(
        "field_form",
        "Add field",
        json!({"form": FieldForm::default(), "action": "/fields/add/"}),
    )
    .await
}

pub async fn add(ctx: Ctx, Form(form): Form<FieldForm>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(fields::create(&ctx.db, actor, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(field) => Ok(see_other(format!("/fields/{}/", field.id))),
        Err(errors) => {
            ctx.render_invalid(
                "field_form",
                "Add field",
                errors,
                json!({"form": form, "action": "/fields/add/"}),
            )
            .await
        }
    }
}

pub async fn edit_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let field = fields::get(&ctx.db, actor, id).await?;
    ctx.render(
        "field_form",
        "Edit field",
        json!({
            "form": FieldForm::from_model(&field),
            "action": format!("/fields/{}/edit/", id),
            "editing": true,
        }),
    )
    .await
}

pub async fn edit(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<FieldForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(fields::update(&ctx.db, actor, id, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(field) => Ok(see_other(format!("/fields/{}/", field.id))),
        Err(errors) => {
            ctx.render_invalid(
                "field_form",
                "Edit field",
                errors,
                json!({
                    "form": form,
                    "action": format!("/fields/{}/edit/", id),
                    "editing": true,
                }),
            )
            .await
        }
    }
}

pub async fn delete_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let field = fields::get(&ctx.db, actor, id).await?;
    ctx.render(
        "confirm_delete",
        "Delete field",
        json!({
            "object_name": field.name,
            "action": format!("/fields/{}/delete/", id),
            "cancel_url": format!("/fields/{}/", id),
        }),
    )
    .await
}

pub async fn delete(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    fields::delete(&ctx.db, actor, id).await?;
    Ok(see_other("/fields/".to_string()))
}
