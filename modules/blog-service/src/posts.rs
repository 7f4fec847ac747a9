//! Blog post operations on top of an [`ItemStore`].

use crate::error::{StoreError, StoreResult};
use crate::store::{ItemStore, Record};
use blog_types::{BlogPost, BlogStats, PostFields};
use serde_json::{Map, Value};

pub fn list_posts(store: &dyn ItemStore) -> StoreResult<Vec<BlogPost>> {
    store
        .load_all()?
        .into_iter()
        .map(Record::into_typed)
        .collect()
}

pub fn find_post(store: &dyn ItemStore, id: u64) -> StoreResult<Option<BlogPost>> {
    store.get(id)?.map(Record::into_typed).transpose()
}

/// New posts start with zero likes. Missing text fields are stored as `null`.
pub fn add_post(store: &dyn ItemStore, input: &PostFields) -> StoreResult<BlogPost> {
    let mut fields = Map::new();
    fields.insert("likes".to_string(), Value::from(0));
    fields.insert("author".to_string(), text_value(input.author.as_deref()));
    fields.insert("title".to_string(), text_value(input.title.as_deref()));
    fields.insert("content".to_string(), text_value(input.content.as_deref()));

    let post: BlogPost = store.insert_new(fields)?.into_typed()?;
    log::info!("Created post #{}", post.id);
    Ok(post)
}

/// Overwrites the fields that are present in `input`.
pub fn edit_post(store: &dyn ItemStore, id: u64, input: &PostFields) -> StoreResult<BlogPost> {
    let mut changes = Map::new();
    let present = [
        ("author", &input.author),
        ("title", &input.title),
        ("content", &input.content),
    ];
    for (key, value) in present {
        if let Some(value) = value {
            changes.insert(key.to_string(), Value::from(value.as_str()));
        }
    }

    let mut changes = Some(changes);
    let post: BlogPost = store
        .modify(id, &mut |record| {
            if let Some(changes) = changes.take() {
                record.merge(changes);
            }
            check_post(record)
        })?
        .into_typed()?;
    log::info!("Updated post #{}", id);
    Ok(post)
}

pub fn like_post(store: &dyn ItemStore, id: u64) -> StoreResult<BlogPost> {
    let post: BlogPost = store
        .modify(id, &mut |record| {
            let likes = match record.field("likes") {
                None => 0,
                Some(value) => value.as_i64().ok_or_else(|| {
                    StoreError::CorruptData(format!(
                        "post {} has a non-integer like count: {}",
                        id, value
                    ))
                })?,
            };
            let likes = likes.checked_add(1).ok_or_else(|| {
                StoreError::InvalidRecord(format!("post {} like count would overflow", id))
            })?;
            record
                .fields
                .insert("likes".to_string(), Value::from(likes));
            check_post(record)
        })?
        .into_typed()?;
    log::info!("Post #{} now has {} likes", id, post.likes);
    Ok(post)
}

pub fn remove_post(store: &dyn ItemStore, id: u64) -> StoreResult<()> {
    store.delete(id)?;
    log::info!("Deleted post #{}", id);
    Ok(())
}

pub fn stats(store: &dyn ItemStore) -> StoreResult<BlogStats> {
    let posts = list_posts(store)?;
    Ok(BlogStats {
        total_posts: posts.len(),
        total_likes: posts.iter().map(|p| p.likes).sum(),
    })
}

pub fn restore(store: &dyn ItemStore, posts: &[BlogPost]) -> StoreResult<usize> {
    let records = posts
        .iter()
        .map(Record::from_typed)
        .collect::<StoreResult<Vec<_>>>()?;
    let count = store.replace_all(records)?;
    log::info!("Restored {} posts from backup", count);
    Ok(count)
}

/// Rejects an edit that would leave a record unreadable as a post, before
/// anything is written.
fn check_post(record: &Record) -> StoreResult<()> {
    record.clone().into_typed::<BlogPost>().map(|_| ())
}

fn text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}
