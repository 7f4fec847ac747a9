//! Shared types for the blog service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Domain Types
// =====================================================

/// A blog post as stored in the backing document.
///
/// Text fields are optional because the form that creates a post may omit
/// them; the document keeps them as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: u64,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub likes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogStats {
    pub total_posts: usize,
    pub total_likes: i64,
}

// =====================================================
// Request Types
// =====================================================

/// Editable post fields. Used both for the HTML forms and the JSON RPC
/// create call. On update, `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFields {
    pub author: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostIdRequest {
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub id: u64,
    #[serde(flatten)]
    pub fields: PostFields,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupRestoreRequest {
    pub posts: Vec<BlogPost>,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub total_posts: usize,
    pub db_file: String,
}
