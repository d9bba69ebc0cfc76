use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use super::record_event;
use crate::auth::Actor;
use crate::entities::{comment, post, post_like};
use crate::error::{AppError, ValidationErrors};
use crate::listing::{search_condition, ListParams};
use crate::validation;

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl From<&post::Model> for PostInput {
    fn from(model: &post::Model) -> Self {
        Self {
            title: model.title.clone(),
            content: model.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent: Option<i32>,
}

/// A post with its comments (oldest first) and like tally.
#[derive(Debug, Clone)]
pub struct PostThread {
    pub post: post::Model,
    pub comments: Vec<comment::Model>,
    pub likes: u64,
    pub liked: bool,
}

async fn threads(
    db: &DatabaseConnection,
    actor: &Actor,
    posts: Vec<post::Model>,
) -> Result<Vec<PostThread>, AppError> {
    let ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut comments: HashMap<i32, Vec<comment::Model>> = HashMap::new();
    for c in comment::Entity::find()
        .filter(comment::Column::PostId.is_in(ids.clone()))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await?
    {
        comments.entry(c.post_id).or_default().push(c);
    }

    let mut likes: HashMap<i32, (u64, bool)> = HashMap::new();
    for like in post_like::Entity::find()
        .filter(post_like::Column::PostId.is_in(ids))
        .all(db)
        .await?
    {
        let entry = likes.entry(like.post_id).or_default();
        entry.0 += 1;
        entry.1 |= like.farmer_id == actor.id;
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let (likes, liked) = likes.get(&post.id).copied().unwrap_or_default();
            PostThread {
                comments: comments.remove(&post.id).unwrap_or_default(),
                likes,
                liked,
                post,
            }
        })
        .collect())
}

pub async fn list(
    db: &DatabaseConnection,
    actor: &Actor,
    params: &ListParams,
) -> Result<Vec<PostThread>, AppError> {
    let mut query = post::Entity::find();
    if let Some(term) = params.search_term() {
        query = query.filter(search_condition(
            &[post::Column::Title, post::Column::Content],
            term,
        ));
    }
    let posts = query
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .all(db)
        .await?;
    threads(db, actor, posts).await
}

async fn find(db: &DatabaseConnection, id: i32) -> Result<post::Model, AppError> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Post"))
}

async fn find_authored(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
) -> Result<post::Model, AppError> {
    let post = find(db, id).await?;
    if post.author_id != actor.id {
        return Err(AppError::Forbidden("You can only change your own posts."));
    }
    Ok(post)
}

pub async fn get(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<PostThread, AppError> {
    let post = find(db, id).await?;
    let mut found = threads(db, actor, vec![post]).await?;
    found.pop().ok_or(AppError::NotFound("Post"))
}

pub async fn create(
    db: &DatabaseConnection,
    actor: &Actor,
    input: PostInput,
) -> Result<post::Model, AppError> {
    validation::validate_post(&input)?;

    let now = chrono::Utc::now().naive_utc();
    let new_post = post::ActiveModel {
        author_id: Set(actor.id),
        title: Set(input.title.trim().to_string()),
        content: Set(input.content),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let post = new_post.insert(db).await?;

    record_event("posts", "create_post", actor.id, "Post published");
    crate::metrics::increment_records_created("posts");
    Ok(post)
}

pub async fn update(
    db: &DatabaseConnection,
    actor: &Actor,
    id: i32,
    input: PostInput,
) -> Result<post::Model, AppError> {
    let existing = find_authored(db, actor, id).await?;
    validation::validate_post(&input)?;

    let mut active = existing.into_active_model();
    active.title = Set(input.title.trim().to_string());
    active.content = Set(input.content);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let post = active.update(db).await?;

    record_event("posts", "update_post", actor.id, "Post updated");
    Ok(post)
}

pub async fn delete(db: &DatabaseConnection, actor: &Actor, id: i32) -> Result<(), AppError> {
    let existing = find_authored(db, actor, id).await?;
    existing.delete(db).await?;

    record_event("posts", "delete_post", actor.id, "Post deleted");
    crate::metrics::increment_records_deleted("posts");
    Ok(())
}

/// Likes the post, or removes the like if the actor already gave one.
/// Returns whether the post is now liked and its like count.
pub async fn toggle_like(
    db: &DatabaseConnection,
    actor: &Actor,
    post_id: i32,
) -> Result<(bool, u64), AppError> {
    find(db, post_id).await?;

    let removed = post_like::Entity::delete_by_id((post_id, actor.id))
        .exec(db)
        .await?;
    let liked = removed.rows_affected == 0;
    if liked {
        let like = post_like::ActiveModel {
            post_id: Set(post_id),
            farmer_id: Set(actor.id),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };
        post_like::Entity::insert(like)
            .exec_without_returning(db)
            .await?;
    }

    let likes = post_like::Entity::find()
        .filter(post_like::Column::PostId.eq(post_id))
        .count(db)
        .await?;

    let event = if liked { "Post liked" } else { "Post unliked" };
    record_event("post_likes", "toggle_like", actor.id, event);
    Ok((liked, likes))
}

pub async fn add_comment(
    db: &DatabaseConnection,
    actor: &Actor,
    post_id: i32,
    input: CommentInput,
) -> Result<comment::Model, AppError> {
    find(db, post_id).await?;

    let mut errors = ValidationErrors::new();
    if input.content.trim().is_empty() {
        errors.add("content", validation::BLANK);
    }
    if let Some(parent_id) = input.parent {
        match comment::Entity::find_by_id(parent_id).one(db).await? {
            Some(parent) if parent.post_id == post_id => {}
            Some(_) => errors.add("parent", "Replies must stay on the same post."),
            None => errors.add(
                "parent",
                format!("Invalid pk \"{}\" - object does not exist.", parent_id),
            ),
        }
    }
    if !errors.is_empty() {
        crate::metrics::increment_validation_rejections("comments");
    }
    errors.into_result()?;

    let new_comment = comment::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(actor.id),
        parent_id: Set(input.parent),
        content: Set(input.content.trim().to_string()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let comment = new_comment.insert(db).await?;

    record_event("comments", "create_comment", actor.id, "Comment added");
    crate::metrics::increment_records_created("comments");
    Ok(comment)
}

pub async fn delete_comment(
    db: &DatabaseConnection,
    actor: &Actor,
    post_id: i32,
    comment_id: i32,
) -> Result<(), AppError> {
    let comment = comment::Entity::find_by_id(comment_id)
        .filter(comment::Column::PostId.eq(post_id))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("Comment"))?;
    if comment.author_id != actor.id {
        return Err(AppError::Forbidden("You can only delete your own comments."));
    }
    comment.delete(db).await?;

    record_event("comments", "delete_comment", actor.id, "Comment deleted");
    crate::metrics::increment_records_deleted("comments");
    Ok(())
}
