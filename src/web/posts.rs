use axum::{
    extract::{Form, Path, Query},
    response::Response,
};
use serde_json::json;

use super::{
    forms::{CommentForm, PostForm},
    see_other, split_validation, Ctx, PageError,
};
use crate::api::posts::{author_names, PostItem};
use crate::auth::Actor;
use crate::entities::post;
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::posts;

async fn authored(ctx: &Ctx, actor: &Actor, id: i32) -> Result<post::Model, PageError> {
    let thread = posts::get(&ctx.db, actor, id).await?;
    if thread.post.author_id != actor.id {
        return Err(AppError::Forbidden("You can only change your own posts.").into());
    }
    Ok(thread.post)
}

pub async fn list(ctx: Ctx, Query(params): Query<ListParams>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let threads = posts::list(&ctx.db, actor, &params).await?;
    let names = author_names(&ctx.db, &threads).await?;
    let items: Vec<PostItem> = threads
        .into_iter()
        .map(|t| PostItem::new(t, &names))
        .collect();
    ctx.render(
        "post_list",
        "Community",
        json!({"posts": items, "search": params.search_term()}),
    )
    .await
}

async fn show_thread(
    ctx: &Ctx,
    id: i32,
    comment_form: CommentForm,
    errors: Option<crate::error::ValidationErrors>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let thread = posts::get(&ctx.db, actor, id).await?;
    let names = author_names(&ctx.db, std::slice::from_ref(&thread)).await?;
    let item = PostItem::new(thread, &names);
    let title = item.title.clone();
    let data = json!({
        "is_author": item.author == actor.id,
        "post": item,
        "comment_form": comment_form,
    });
    match errors {
        Some(errors) => ctx.render_invalid("post_detail", &title, errors, data).await,
        None => ctx.render("post_detail", &title, data).await,
    }
}

pub async fn detail(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    show_thread(&ctx, id, CommentForm::default(), None).await
}

pub async fn add_page(ctx: Ctx) -> Result<Response, PageError> {
    ctx.render(
        "post_form",
        "New post",
        json!({"form": PostForm::default(), "action": "/post/add/"}),
    )
    .await
}

pub async fn add(ctx: Ctx, Form(form): Form<PostForm>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    match split_validation(posts::create(&ctx.db, actor, form.clean()).await)? {
        Ok(post) => Ok(see_other(format!("/post/{}/", post.id))),
        Err(errors) => {
            ctx.render_invalid(
                "post_form",
                "New post",
                errors,
                json!({"form": form, "action": "/post/add/"}),
            )
            .await
        }
    }
}

pub async fn edit_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let post = authored(&ctx, actor, id).await?;
    let form = PostForm {
        title: post.title,
        content: post.content,
    };
    ctx.render(
        "post_form",
        "Edit post",
        json!({"form": form, "action": format!("/post/{}/edit/", id), "editing": true}),
    )
    .await
}

pub async fn edit(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<PostForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    match split_validation(posts::update(&ctx.db, actor, id, form.clean()).await)? {
        Ok(post) => Ok(see_other(format!("/post/{}/", post.id))),
        Err(errors) => {
            ctx.render_invalid(
                "post_form",
                "Edit post",
                errors,
                json!({"form": form, "action": format!("/post/{}/edit/", id), "editing": true}),
            )
            .await
        }
    }
}

pub async fn delete_page(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let post = authored(&ctx, actor, id).await?;
    ctx.render(
        "confirm_delete",
        "Delete post",
        json!({
            "object_name": post.title,
            "action": format!("/post/{}/delete/", id),
            "cancel_url": format!("/post/{}/", id),
        }),
    )
    .await
}

pub async fn delete(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    posts::delete(&ctx.db, actor, id).await?;
    Ok(see_other("/post/".to_string()))
}

// POST /post/:id/comment/
pub async fn comment(
    ctx: Ctx,
    Path(id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    let outcome = match form.clean() {
        Ok(input) => split_validation(posts::add_comment(&ctx.db, actor, id, input).await)?,
        Err(errors) => Err(errors),
    };
    match outcome {
        Ok(_) => Ok(see_other(format!("/post/{}/", id))),
        Err(errors) => show_thread(&ctx, id, form, Some(errors)).await,
    }
}

// POST /post/:id/like/
pub async fn like(ctx: Ctx, Path(id): Path<i32>) -> Result<Response, PageError> {
    let actor = ctx.actor()?;
    posts::toggle_like(&ctx.db, actor, id).await?;
    Ok(see_other(format!("/post/{}/", id)))
}
