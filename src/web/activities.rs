use axum::{
    extract::{Form, Path, Query},
    response::Response,
};
use sea_orm::ActiveEnum;
use serde_json::{json, Value};

use super::{
    forms::{self, ActivityForm},
    see_other, split_validation, Ctx, PageError,
};
use crate::auth::Actor;
use crate::entities::prelude::ActivityStatus;
use crate::error::ValidationErrors;
use crate::listing::ListParams;
use crate::services::{self, activities, crops, fields};

async fn form_data(
    ctx: &Ctx,
    actor: &Actor,
    form: &ActivityForm,
    action: String,
) -> Result<Value, PageError> {
    let params = ListParams::default();
    let owned_fields = fields::list(&ctx.db, actor, &params).await?;
    let owned_crops = crops::list(&ctx.db, actor, &params).await?;
    Ok(json!({
        "form": form,
        "action": action,
        "field_choices": forms::id_choices(owned_fields.into_iter().map(|f| (f.id, f.name)), &form.field),
        "crop_choices": forms::id_choices(owned_crops.into_iter().map(|(c, _)| (c.id, c.name)), &form.crop),
        "status_choices": forms::choices::<ActivityStatus>(&form.status),
    }))
}

async fn show_form(
    ctx: &Ctx,
    title: &str,
    form: &ActivityForm,
    action: String,
    errors: Option<ValidationErrors>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let data = form_data(ctx, actor, form, action).await?;
    match errors {
        Some(errors) => ctx.render_invalid("activity_form", title, errors, data).await,
        None => ctx.render("activity_form", title, data).await,
    }
}

// GET /activities/?status=completed
pub async fn list(ctx: Ctx, Query(params): Query<ListParams>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let rows = activities::list(&ctx.db, actor, &params).await?;
    let field_names =
        services::field_names(&ctx.db, rows.iter().filter_map(|a| a.field_id).collect()).await?;
    let rows: Vec<Value> = rows
        .into_iter()
        .map(|activity| {
            let field_name = activity.field_id.and_then(|id| field_names.get(&id).cloned());
            json!({
                "status_label": forms::choice_label(&activity.status.to_value()),
                "activity": activity,
                "field_name": field_name,
            })
        })
        .collect();

    let current_status = params.status_filter().unwrap_or("all");
    ctx.render(
        "activity_list",
        "Activities",
        json!({
            "activities": rows,
            "current_status": current_status,
            "status_choices": forms::choices::<ActivityStatus>(current_status),
            "search": params.search_term(),
        }),
    )
    .await
}

pub async fn detail(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let activity = activities::get(&ctx.db, actor, id).await?;
    let field_name = services::field_names(&ctx.db, activity.field_id.into_iter().collect())
        .await?
        .into_values()
        .next();
    let crop_name = services::crop_names(&ctx.db, activity.crop_id.into_iter().collect())
        .await?
        .into_values()
        .next();
    let title = activity.title.clone();
    ctx.render(
        "activity_detail",
        &title,
        json!({
            "status_label": forms::choice_label(&activity.status.to_value()),
            "activity": activity,
            "field_name": field_name,
            "crop_name": crop_name,
        }),
    )
    .await
}

pub async fn add_page(ctx: Ctx) -> Result<Response, PageError> {
    let form = ActivityForm {
        status: "scheduled".to_string(),
        ..Default::default()
    };
    show_form(&ctx, "Schedule activity", &form, "/activities/add/".to_string(), None).await
}

pub async fn add(ctx: Ctx, Form(form): Form<ActivityForm>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(activities::create(&ctx.db, actor, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(activity) => Ok(see_other(format!("/activities/{}/", activity.id))),
        Err(errors) => {
            show_form(
                &ctx,
                "Schedule activity",
                &form,
                "/activities/add/".to_string(),
                Some(errors),
            )
            .await
        }
    }
}

pub async fn edit_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let activity = activities::get(&ctx.db, actor, id).await?;
    let form = ActivityForm::from_model(&activity);
    show_form(&ctx, "Edit activity", &form, format!("/activities/{}/edit/", id), None).await
}

pub async fn edit(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<ActivityForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(activities::update(&ctx.db, actor, id, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(activity) => Ok(see_other(format!("/activities/{}/", activity.id))),
        Err(errors) => {
            show_form(
                &ctx,
                "Edit activity",
                &form,
                format!("/activities/{}/edit/", id),
                Some(errors),
            )
            .await
        }
    }
}

pub async fn delete_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let activity = activities::get(&ctx.db, actor, id).await?;
    ctx.render(
        "confirm_delete",
        "Delete activity",
        json!({
            "object_name": activity.title,
            "action": format!("/activities/{}/delete/", id),
            "cancel_url": format!("/activities/{}/", id),
        }),
    )
    .await
}

pub async fn delete(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    activities::delete(&ctx.db, actor, id).await?;
    Ok(see_other("/activities/".to_string()))
}
