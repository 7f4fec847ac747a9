//! Axum route handlers for the blog RPC API.

use crate::error::StoreError;
use crate::posts;
use crate::store::ItemStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use blog_types::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

type RpcResult<T> = (StatusCode, Json<RpcResponse<T>>);

fn reply<T: Serialize>(result: Result<T, StoreError>) -> RpcResult<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(RpcResponse::ok(data))),
        Err(e) => {
            if !e.is_not_found() {
                log::error!("RPC store failure: {}", e);
            }
            (e.status_code(), Json(RpcResponse::err(e.to_string())))
        }
    }
}

// =====================================================
// Post Endpoints
// =====================================================

// GET /rpc/posts/list
pub async fn posts_list(State(state): State<Arc<AppState>>) -> RpcResult<Vec<BlogPost>> {
    reply(posts::list_posts(state.store.as_ref()))
}

// POST /rpc/posts/get
pub async fn posts_get(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PostIdRequest>,
) -> RpcResult<Option<BlogPost>> {
    reply(posts::find_post(state.store.as_ref(), req.id))
}

// POST /rpc/posts/create
pub async fn posts_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PostFields>,
) -> RpcResult<BlogPost> {
    reply(posts::add_post(state.store.as_ref(), &req))
}

// POST /rpc/posts/update
pub async fn posts_update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePostRequest>,
) -> RpcResult<BlogPost> {
    reply(posts::edit_post(state.store.as_ref(), req.id, &req.fields))
}

// POST /rpc/posts/delete
pub async fn posts_delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PostIdRequest>,
) -> RpcResult<bool> {
    reply(posts::remove_post(state.store.as_ref(), req.id).map(|()| true))
}

// POST /rpc/posts/like
pub async fn posts_like(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PostIdRequest>,
) -> RpcResult<BlogPost> {
    reply(posts::like_post(state.store.as_ref(), req.id))
}

// =====================================================
// Service Endpoints
// =====================================================

// GET /rpc/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> RpcResult<BlogStats> {
    reply(posts::stats(state.store.as_ref()))
}

// GET /rpc/status
pub async fn status(State(state): State<Arc<AppState>>) -> RpcResult<ServiceStatus> {
    let total_posts = state.store.load_all().map(|r| r.len()).unwrap_or(0);
    let status = ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        total_posts,
        db_file: state.store.location(),
    };
    (StatusCode::OK, Json(RpcResponse::ok(status)))
}

// POST /rpc/backup/export
pub async fn backup_export(State(state): State<Arc<AppState>>) -> RpcResult<Vec<BlogPost>> {
    reply(posts::list_posts(state.store.as_ref()))
}

// POST /rpc/backup/restore
pub async fn backup_restore(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BackupRestoreRequest>,
) -> RpcResult<usize> {
    reply(posts::restore(state.store.as_ref(), &req.posts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonStore;
    use tempfile::TempDir;

    fn test_state() -> (TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::create_empty(dir.path().join("posts.json")).unwrap();
        (dir, Arc::new(AppState::new(Arc::new(store))))
    }

    fn new_post(title: &str) -> PostFields {
        PostFields {
            author: Some("ann".to_string()),
            title: Some(title.to_string()),
            content: Some("body".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let (_dir, state) = test_state();

        let (code, Json(created)) = posts_create(State(state.clone()), Json(new_post("A"))).await;
        assert_eq!(code, StatusCode::OK);
        let created = created.data.unwrap();
        assert_eq!(created.id, 1);

        let (code, Json(found)) =
            posts_get(State(state.clone()), Json(PostIdRequest { id: 1 })).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(found.data.unwrap(), Some(created.clone()));

        let (_, Json(missing)) =
            posts_get(State(state.clone()), Json(PostIdRequest { id: 2 })).await;
        assert!(missing.success);
        assert_eq!(missing.data.unwrap(), None);

        let (_, Json(all)) = posts_list(State(state.clone())).await;
        assert_eq!(all.data.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_like_update_and_stats() {
        let (_dir, state) = test_state();
        posts_create(State(state.clone()), Json(new_post("A"))).await;
        posts_create(State(state.clone()), Json(new_post("B"))).await;

        posts_like(State(state.clone()), Json(PostIdRequest { id: 2 })).await;
        let (code, Json(liked)) =
            posts_like(State(state.clone()), Json(PostIdRequest { id: 2 })).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(liked.data.unwrap().likes, 2);

        let update = UpdatePostRequest {
            id: 1,
            fields: PostFields {
                content: Some("rewritten".to_string()),
                ..PostFields::default()
            },
        };
        let (_, Json(updated)) = posts_update(State(state.clone()), Json(update)).await;
        let updated = updated.data.unwrap();
        assert_eq!(updated.content.as_deref(), Some("rewritten"));
        assert_eq!(updated.title.as_deref(), Some("A"));

        let (_, Json(stats)) = stats(State(state.clone())).await;
        let stats = stats.data.unwrap();
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_likes, 2);
    }

    #[tokio::test]
    async fn test_missing_post_errors_are_404() {
        let (_dir, state) = test_state();

        let (code, Json(resp)) =
            posts_delete(State(state.clone()), Json(PostIdRequest { id: 4 })).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("'4'"));

        let (code, _) = posts_like(State(state.clone()), Json(PostIdRequest { id: 4 })).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_backup_round_trip() {
        let (_dir, state) = test_state();
        posts_create(State(state.clone()), Json(new_post("A"))).await;
        posts_create(State(state.clone()), Json(new_post("B"))).await;

        let (_, Json(exported)) = backup_export(State(state.clone())).await;
        let exported = exported.data.unwrap();

        posts_delete(State(state.clone()), Json(PostIdRequest { id: 1 })).await;

        let (code, Json(restored)) = backup_restore(
            State(state.clone()),
            Json(BackupRestoreRequest {
                posts: exported.clone(),
            }),
        )
        .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(restored.data, Some(2));

        let (_, Json(all)) = posts_list(State(state.clone())).await;
        assert_eq!(all.data.unwrap(), exported);

        let (_, Json(status)) = status(State(state.clone())).await;
        let status = status.data.unwrap();
        assert!(status.running);
        assert_eq!(status.total_posts, 2);
        assert!(status.db_file.ends_with("posts.json"));
    }
}
