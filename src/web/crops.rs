use axum::{
    extract::{Form, Path, Query},
    response::Response,
};
use serde_json::{json, Value};

use super::{
    forms::{self, CropForm},
    see_other, split_validation, Ctx, PageError,
};
use crate::auth::Actor;
use crate::entities::prelude::CropStatus;
use crate::error::ValidationErrors;
use crate::listing::ListParams;
use crate::services::{crops, fields};

/// Form context: the raw values plus the farmer's fields and the statuses.
async fn form_data(
    ctx: &Ctx,
    actor: &Actor,
    form: &CropForm,
    action: String,
) -> Result<Value, PageError> {
    let owned = fields::list(&ctx.db, actor, &ListParams::default()).await?;
    Ok(json!({
        "form": form,
        "action": action,
        "field_choices": forms::id_choices(owned.into_iter().map(|f| (f.id, f.name)), &form.fields),
        "status_choices": forms::choices::<CropStatus>(&form.status),
    }))
}

async fn show_form(
    ctx: &Ctx,
    title: &str,
    form: &CropForm,
    action: String,
    errors: Option<ValidationErrors>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let data = form_data(ctx, actor, form, action).await?;
    match errors {
        Some(errors) => ctx.render_invalid("crop_form", title, errors, data).await,
        None => ctx.render("crop_form", title, data).await,
    }
}

pub async fn list(ctx: Ctx, Query(params): Query<ListParams>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let rows: Vec<Value> = crops::list(&ctx.db, actor, &params)
        .await?
        .into_iter()
        .map(|(crop, field)| {
            json!({
                "crop": crop,
                "field_name": field.map(|f| f.name),
            })
        })
        .collect();
    ctx.render(
        "crop_list",
        "My crops",
        json!({"crops": rows, "search": params.search_term()}),
    )
    .await
}

pub async fn detail(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let (crop, field) = crops::get_with_field(&ctx.db, actor, id).await?;
    let title = crop.name.clone();
    ctx.render(
        "crop_detail",
        &title,
        json!({"crop": crop, "field": field}),
    )
    .await
}

pub async fn add_page(ctx: Ctx) -> Result<Response, PageError> {
    let form = CropForm {
        status: "planted".to_string(),
        ..Default::default()
    };
    show_form(&ctx, "Add crop", &form, "/crops/add/".to_string(), None).await
}

pub async fn add(ctx: Ctx, Form(form): Form<CropForm>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(crops::create(&ctx.db, actor, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(crop) => Ok(see_other(format!("/crops/{}/", crop.id))),
        Err(errors) => {
            show_form(&ctx, "Add crop", &form, "/crops/add/".to_string(), Some(errors)).await
        }
    }
}

pub async fn edit_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let crop = crops::get(&ctx.db, actor, id).await?;
    let form = CropForm::from_model(&crop);
    show_form(&ctx, "Edit crop", &form, format!("/crops/{}/edit/", id), None).await
}

pub async fn edit(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<CropForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(crops::update(&ctx.db, actor, id, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(crop) => Ok(see_other(format!("/crops/{}/", crop.id))),
        Err(errors) => {
            show_form(
                &ctx,
                "Edit crop",
                &form,
                format!("/crops/{}/edit/", id),
                Some(errors),
            )
            .await
        }
    }
}

pub async fn delete_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let crop = crops::get(&ctx.db, actor, id).await?;
    ctx.render(
        "confirm_delete",
        "Delete crop",
        json!({
            "object_name": crop.name,
            "action": format!("/crops/{}/delete/", id),
            "cancel_url": format!("/crops/{}/", id),
        }),
    )
    .await
}

pub async fn delete(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    crops::delete(&ctx.db, actor, id).await?;
    Ok(see_other("/crops/".to_string()))
}
