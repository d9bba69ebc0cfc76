use std::collections::HashMap;

use axum::{
    extract::Extension,
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Actor;
use crate::entities::comment;
use crate::error::AppError;
use crate::listing::ListParams;
use crate::services::{
    self,
    posts::{self, CommentInput, PostInput, PostThread},
};

#[derive(Serialize)]
pub struct CommentItem {
    pub id: i32,
    pub author: i32,
    pub author_name: String,
    pub parent: Option<i32>,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl CommentItem {
    pub(crate) fn new(model: comment::Model, names: &HashMap<i32, String>) -> Self {
        Self {
            author_name: names.get(&model.author_id).cloned().unwrap_or_default(),
            id: model.id,
            author: model.author_id,
            parent: model.parent_id,
            content: model.content,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct PostItem {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: i32,
    pub author_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub likes: u64,
    pub liked: bool,
    pub comments: Vec<CommentItem>,
}

impl PostItem {
    pub(crate) fn new(thread: PostThread, names: &HashMap<i32, String>) -> Self {
        let post = thread.post;
        Self {
            author_name: names.get(&post.author_id).cloned().unwrap_or_default(),
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            likes: thread.likes,
            liked: thread.liked,
            comments: thread
                .comments
                .into_iter()
                .map(|c| CommentItem::new(c, names))
                .collect(),
        }
    }
}

pub(crate) async fn author_names(
    db: &DatabaseConnection,
    threads: &[PostThread],
) -> Result<HashMap<i32, String>, AppError> {
    let ids: Vec<i32> = threads
        .iter()
        .flat_map(|t| std::iter::once(t.post.author_id).chain(t.comments.iter().map(|c| c.author_id)))
        .collect();
    Ok(services::usernames(db, ids).await?)
}

async fn item(
    db: &DatabaseConnection,
    actor: &Actor,
    post_id: i32,
) -> Result<PostItem, AppError> {
    let thread = posts::get(db, actor, post_id).await?;
    let names = author_names(db, std::slice::from_ref(&thread)).await?;
    Ok(PostItem::new(thread, &names))
}

#[derive(Deserialize)]
pub struct PostPatch {
    title: Option<String>,
    content: Option<String>,
}

pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<PostItem>>, AppError> {
    let threads = posts::list(&db, &actor, &params).await?;
    let names = author_names(&db, &threads).await?;
    Ok(Json(
        threads
            .into_iter()
            .map(|t| PostItem::new(t, &names))
            .collect(),
    ))
}

pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<PostInput>,
) -> Result<(StatusCode, Json<PostItem>), AppError> {
    let post = posts::create(&db, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(item(&db, &actor, post.id).await?)))
}

pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PostItem>, AppError> {
    Ok(Json(item(&db, &actor, id).await?))
}

pub async fn replace_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PostInput>,
) -> Result<Json<PostItem>, AppError> {
    posts::update(&db, &actor, id, payload).await?;
    Ok(Json(item(&db, &actor, id).await?))
}

pub async fn patch_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<PostPatch>,
) -> Result<Json<PostItem>, AppError> {
    let existing = posts::get(&db, &actor, id).await?;
    let base = PostInput::from(&existing.post);
    let payload = PostInput {
        title: patch.title.unwrap_or(base.title),
        content: patch.content.unwrap_or(base.content),
    };
    posts::update(&db, &actor, id, payload).await?;
    Ok(Json(item(&db, &actor, id).await?))
}

pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    posts::delete(&db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/posts/:id/like/
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Value>, AppError> {
    let (liked, likes) = posts::toggle_like(&db, &actor, id).await?;
    Ok(Json(json!({"liked": liked, "likes": likes})))
}

// POST /api/posts/:id/comments/
pub async fn add_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CommentInput>,
) -> Result<(StatusCode, Json<CommentItem>), AppError> {
    let comment = posts::add_comment(&db, &actor, id, payload).await?;
    let names = services::usernames(&db, vec![comment.author_id]).await?;
    Ok((StatusCode::CREATED, Json(CommentItem::new(comment, &names))))
}

// DELETE /api/posts/:id/comments/:comment_id/
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(actor): Extension<Actor>,
    ApiPath((id, comment_id)): ApiPath<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    posts::delete_comment(&db, &actor, id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
