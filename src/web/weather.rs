use axum::{
    extract::{Form, Path, Query},
    response::Response,
};
use serde_json::{json, Value};

use super::{
    forms::{self, WeatherForm},
    see_other, split_validation, Ctx, PageError,
};
use crate::auth::Actor;
use crate::entities::prelude::WeatherSource;
use crate::error::ValidationErrors;
use crate::listing::ListParams;
use crate::services::{self, fields, weather};

async fn form_data(
    ctx: &Ctx,
    actor: &Actor,
    form: &WeatherForm,
    action: String,
) -> Result<Value, PageError> {
    let owned = fields::list(&ctx.db, actor, &ListParams::default()).await?;
    Ok(json!({
        "form": form,
        "action": action,
        "field_choices": forms::id_choices(owned.into_iter().map(|f| (f.id, f.name)), &form.field),
        "source_choices": forms::choices::<WeatherSource>(&form.source),
    }))
}

async fn show_form(
    ctx: &Ctx,
    title: &str,
    form: &WeatherForm,
    action: String,
    errors: Option<ValidationErrors>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let data = form_data(ctx, actor, form, action).await?;
    match errors {
        Some(errors) => ctx.render_invalid("weather_form", title, errors, data).await,
        None => ctx.render("weather_form", title, data).await,
    }
}

// GET /weathers/?page=N
pub async fn list(ctx: Ctx, Query(params): Query<ListParams>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let page = weather::list(&ctx.db, actor, &params).await?;
    let field_names =
        services::field_names(&ctx.db, page.results.iter().filter_map(|r| r.field_id).collect()).await?;
    let page = page.map(|record| {
        let field_name = record.field_id.and_then(|id| field_names.get(&id).cloned());
        json!({"record": record, "field_name": field_name})
    });
    ctx.render("weather_list", "Weather records", json!({"page": page}))
        .await
}

pub async fn detail(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let record = weather::get(&ctx.db, actor, id).await?;
    let field_name = services::field_names(&ctx.db, record.field_id.into_iter().collect())
        .await?
        .into_values()
        .next();
    ctx.render(
        "weather_detail",
        "Weather record",
        json!({"record": record, "field_name": field_name}),
    )
    .await
}

pub async fn add_page(ctx: Ctx) -> Result<Response, PageError> {
    let form = WeatherForm {
        source: "manual".to_string(),
        ..Default::default()
    };
    show_form(&ctx, "Record weather", &form, "/weathers/add/".to_string(), None).await
}

pub async fn add(ctx: Ctx, Form(form): Form<WeatherForm>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(weather::create(&ctx.db, actor, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(record) => Ok(see_other(format!("/weathers/{}/", record.id))),
        Err(errors) => {
            show_form(
                &ctx,
                "Record weather",
                &form,
                "/weathers/add/".to_string(),
                Some(errors),
            )
            .await
        }
    }
}

pub async fn edit_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let record = weather::get(&ctx.db, actor, id).await?;
    let form = WeatherForm::from_model(&record);
    show_form(&ctx, "Edit weather record", &form, format!("/weathers/{}/edit/", id), None).await
}

pub async fn edit(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<WeatherForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(weather::update(&ctx.db, actor, id, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(record) => Ok(see_other(format!("/weathers/{}/", record.id))),
        Err(errors) => {
            show_form(
                &ctx,
                "Edit weather record",
                &form,
                format!("/weathers/{}/edit/", id),
                Some(errors),
            )
            .await
        }
    }
}

pub async fn delete_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let record = weather::get(&ctx.db, actor, id).await?;
    ctx.render(
        "confirm_delete",
        "Delete weather record",
        json!({
            "object_name": format!("{} at {}", record.location, record.recorded_at.format("%Y-%m-%d %H:%M")),
            "action": format!("/weathers/{}/delete/", id),
            "cancel_url": format!("/weathers/{}/", id),
        }),
    )
    .await
}

pub async fn delete(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    weather::delete(&ctx.db, actor, id).await?;
    Ok(see_other("/weathers/".to_string()))
}
