//! HTML pages and form handlers for the blog.

use crate::error::StoreError;
use crate::posts;
use crate::routes::AppState;
use axum::extract::rejection::PathRejection;
use axum::extract::{Form, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use blog_types::{BlogPost, PostFields};
use std::sync::Arc;

// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let posts = match posts::list_posts(state.store.as_ref()) {
        Ok(posts) => posts,
        Err(e) => return error_page(e),
    };

    let mut cards = String::new();
    for p in &posts {
        cards.push_str(&format!(
            r#"<div class="post">
      <h2>{title}</h2>
      <p class="meta">by {author}</p>
      <p>{content}</p>
      <div class="actions">
        <form method="post" action="/like/{id}"><button class="like">Like ({likes})</button></form>
        <a class="btn" href="/update/{id}">Update</a>
        <form method="post" action="/delete/{id}"><button class="danger">Delete</button></form>
      </div>
    </div>
"#,
            id = p.id,
            title = escape(p.title.as_deref().unwrap_or("Untitled")),
            author = escape(p.author.as_deref().unwrap_or("anonymous")),
            content = escape(p.content.as_deref().unwrap_or("")),
            likes = p.likes,
        ));
    }
    if cards.is_empty() {
        cards = "<p class=\"meta\">No posts yet.</p>".to_string();
    }

    let body = format!(
        r#"<h1>Blog</h1>
  <p class="meta">{count} posts &middot; <a href="/add">Add a new post</a></p>
  {cards}"#,
        count = posts.len(),
        cards = cards,
    );
    html_page("Blog", &body)
}

// GET /add
pub async fn add_form() -> Response {
    let body = format!(
        r#"<h1>Add a new post</h1>
  {form}"#,
        form = post_form("/add", None, "Submit"),
    );
    html_page("Add post", &body)
}

// POST /add
pub async fn add_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PostFields>,
) -> Response {
    match posts::add_post(state.store.as_ref(), &form) {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => error_page(e),
    }
}

// GET /update/:post_id
pub async fn update_form(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Response {
    let post_id = match parse_post_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match posts::find_post(state.store.as_ref(), post_id) {
        Ok(Some(post)) => {
            let body = format!(
                r#"<h1>Update post</h1>
  {form}"#,
                form = post_form(&format!("/update/{}", post.id), Some(&post), "Update"),
            );
            html_page("Update post", &body)
        }
        Ok(None) => post_not_found(post_id),
        Err(e) => error_page(e),
    }
}

// POST /update/:post_id
pub async fn update_submit(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u64>, PathRejection>,
    Form(form): Form<PostFields>,
) -> Response {
    let post_id = match parse_post_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match posts::edit_post(state.store.as_ref(), post_id, &form) {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) if e.is_not_found() => post_not_found(post_id),
        Err(e) => error_page(e),
    }
}

// POST /delete/:post_id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Response {
    let post_id = match parse_post_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match posts::remove_post(state.store.as_ref(), post_id) {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) if e.is_not_found() => post_not_found(post_id),
        Err(e) => error_page(e),
    }
}

// POST /like/:post_id
pub async fn like(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Response {
    let post_id = match parse_post_id(path) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match posts::like_post(state.store.as_ref(), post_id) {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) if e.is_not_found() => post_not_found(post_id),
        Err(e) => error_page(e),
    }
}

/// A path segment that is not a post id answers like a missing post.
fn parse_post_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, Response> {
    path.map(|Path(id)| id).map_err(|rejection| {
        log::warn!("Bad post id in path: {}", rejection);
        (StatusCode::NOT_FOUND, "Post not found").into_response()
    })
}

fn post_not_found(post_id: u64) -> Response {
    log::warn!("Post #{} not found", post_id);
    (StatusCode::NOT_FOUND, "Post not found").into_response()
}

fn error_page(e: StoreError) -> Response {
    log::error!("Store failure: {}", e);
    (e.status_code(), format!("Error: {}", e)).into_response()
}

fn post_form(action: &str, post: Option<&BlogPost>, submit: &str) -> String {
    let author = post.and_then(|p| p.author.as_deref()).unwrap_or("");
    let title = post.and_then(|p| p.title.as_deref()).unwrap_or("");
    let content = post.and_then(|p| p.content.as_deref()).unwrap_or("");
    format!(
        r#"<form method="post" action="{action}">
    <label>Author<input type="text" name="author" value="{author}"></label>
    <label>Title<input type="text" name="title" value="{title}"></label>
    <label>Content<textarea name="content" rows="8">{content}</textarea></label>
    <button type="submit">{submit}</button>
    <a class="btn" href="/">Cancel</a>
  </form>"#,
        action = escape(action),
        author = escape(author),
        title = escape(title),
        content = escape(content),
        submit = submit,
    )
}

fn html_page(title: &str, body: &str) -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; max-width: 760px; margin: 0 auto; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  h2 {{ color: #c9d1d9; margin-bottom: 4px; font-size: 1.2em; }}
  a {{ color: #58a6ff; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 16px; }}
  .post {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px 20px; margin-bottom: 16px; }}
  .post p {{ white-space: pre-wrap; }}
  .actions {{ display: flex; gap: 8px; margin-top: 12px; align-items: center; }}
  button, .btn {{ background: #21262d; border: 1px solid #30363d; color: #c9d1d9; padding: 4px 12px; border-radius: 6px; font-size: 0.85em; cursor: pointer; text-decoration: none; }}
  button.like {{ color: #3fb950; }}
  button.danger {{ color: #f85149; }}
  label {{ display: block; color: #8b949e; font-size: 0.85em; margin-bottom: 12px; }}
  input, textarea {{ display: block; width: 100%; margin-top: 4px; background: #0d1117; border: 1px solid #30363d; border-radius: 6px; color: #e0e0e0; padding: 6px 8px; font: inherit; }}
</style>
</head>
<body>
  {body}
</body>
</html>"#,
        title = escape(title),
        body = body,
    );

    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ItemStore, JsonStore, Record};
    use tempfile::TempDir;

    fn test_state() -> (TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::create_empty(dir.path().join("posts.json")).unwrap();
        (dir, Arc::new(AppState::new(Arc::new(store))))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn fields(author: &str, title: &str, content: &str) -> PostFields {
        PostFields {
            author: Some(author.to_string()),
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[tokio::test]
    async fn test_add_then_index_lists_post() {
        let (_dir, state) = test_state();

        let response = add_submit(
            State(state.clone()),
            Form(fields("ann", "<script>hi</script>", "body")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let response = index(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("&lt;script&gt;hi&lt;/script&gt;"));
        assert!(!html.contains("<script>hi"));
        assert!(html.contains("Like (0)"));
        assert!(html.contains("/update/1"));
    }

    #[tokio::test]
    async fn test_update_form_prefills_values() {
        let (_dir, state) = test_state();
        posts::add_post(state.store.as_ref(), &fields("ann", "Hello", "First")).unwrap();

        let response = update_form(State(state.clone()), Ok(Path(1))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"value="Hello""#));
        assert!(html.contains(">First</textarea>"));
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let (_dir, state) = test_state();

        let response = update_form(State(state.clone()), Ok(Path(7))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Post not found");

        let response =
            update_submit(State(state.clone()), Ok(Path(7)), Form(fields("a", "b", "c"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = delete(State(state.clone()), Ok(Path(7))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = like(State(state.clone()), Ok(Path(7))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_like_update_delete_flow() {
        let (_dir, state) = test_state();
        posts::add_post(state.store.as_ref(), &fields("ann", "A", "first")).unwrap();
        posts::add_post(state.store.as_ref(), &fields("bob", "B", "second")).unwrap();

        let response = like(State(state.clone()), Ok(Path(1))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let form = Form(fields("ann", "A2", "edited"));
        let response = update_submit(State(state.clone()), Ok(Path(1)), form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = delete(State(state.clone()), Ok(Path(2))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let remaining = state.store.load_all().unwrap();
        assert_eq!(
            remaining,
            vec![
                Record::new(1)
                    .with_field("author", "ann")
                    .with_field("title", "A2")
                    .with_field("content", "edited")
                    .with_field("likes", 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_is_500() {
        let (dir, state) = test_state();
        std::fs::write(dir.path().join("posts.json"), "{oops").unwrap();

        let response = index(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
