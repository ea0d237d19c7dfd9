use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notifications::repo::NotificationKind;

fn default_kind() -> NotificationKind {
    NotificationKind::Generic
}

fn default_data() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    #[serde(default = "default_kind")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default = "default_data")]
    pub data: Value,
}

#[derive(Debug, Deserialize, Default)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub modified: u64,
}
