// noskem/src/services/notifications.rs

use crate::db::{RemoteDb, Table};
use crate::errors::Result;
use crate::models::NotificationKind;
use serde_json::json;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Inserts one unread notification for `user_id`.
#[instrument(name = "notifications::notify", skip(db, message), err(Display))]
pub async fn notify(
  db: &dyn RemoteDb,
  user_id: Uuid,
  kind: NotificationKind,
  message: &str,
  link: Option<&str>,
) -> Result<()> {
  db.insert(
    Table::Notifications,
    json!({
      "user_id": user_id,
      "type": kind,
      "message": message,
      "link": link,
    }),
  )
  .await?;
  Ok(())
}

/// [`notify`] for optional steps: a failure is logged and swallowed.
pub async fn notify_or_warn(
  db: &dyn RemoteDb,
  user_id: Uuid,
  kind: NotificationKind,
  message: &str,
  link: Option<&str>,
) {
  if let Err(e) = notify(db, user_id, kind, message, link).await {
    warn!(%user_id, ?kind, error = %e, "Notification not delivered.");
  }
}
