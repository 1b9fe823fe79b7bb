// SPDX-License-Identifier: MIT

//! Comment operations scoped to a pin.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::comment::sort_newest_first;
use crate::models::Comment;

impl FirestoreDb {
    /// Add a comment to a pin. Expired pins are read-only for everyone but
    /// the owner.
    pub async fn add_comment(
        &self,
        pin_id: &str,
        user_id: &str,
        text: String,
    ) -> Result<Comment, AppError> {
        let pin = self
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", pin_id)))?;

        let now = chrono::Utc::now();
        if pin.is_expired(now) && pin.created_by != user_id {
            return Err(AppError::PermissionDenied(
                "This hangout has expired".to_string(),
            ));
        }

        let comment = Comment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            pin_id: pin_id.to_string(),
            user_id: user_id.to_string(),
            text,
            created_at: now,
            updated_at: now,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COMMENTS)
            .document_id(&comment.id)
            .object(&comment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(comment)
    }

    /// Edit a comment's text. Author-only.
    pub async fn update_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        text: String,
    ) -> Result<Comment, AppError> {
        let mut comment = self
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} does not exist", comment_id)))?;

        if comment.user_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the author can edit a comment".to_string(),
            ));
        }

        comment.text = text;
        comment.updated_at = chrono::Utc::now();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["text", "updated_at"])
            .in_col(collections::COMMENTS)
            .document_id(comment_id)
            .object(&comment)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(comment)
    }

    /// Delete a comment. Author-only.
    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<(), AppError> {
        let comment = self
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} does not exist", comment_id)))?;

        if comment.user_id != user_id {
            return Err(AppError::PermissionDenied(
                "Only the author can delete a comment".to_string(),
            ));
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::COMMENTS)
            .document_id(comment_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// All comments on a pin, newest first.
    pub async fn comments_for_pin(&self, pin_id: &str) -> Result<Vec<Comment>, AppError> {
        let client = self.get_client()?;

        let pid = pin_id.to_string();
        let ordered = client
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| q.for_all([q.field("pin_id").eq(pid.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj::<Comment>()
            .query()
            .await;

        match ordered {
            Ok(comments) => Ok(comments),
            Err(e) => {
                // Same missing-index fallback as the pin queries.
                tracing::warn!(
                    error = %e,
                    pin_id,
                    "Ordered comment query failed, falling back to in-memory sort"
                );

                let pid = pin_id.to_string();
                let mut comments: Vec<Comment> = client
                    .fluent()
                    .select()
                    .from(collections::COMMENTS)
                    .filter(move |q| q.for_all([q.field("pin_id").eq(pid.clone())]))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                sort_newest_first(&mut comments);
                Ok(comments)
            }
        }
    }

    /// Get a comment by ID. Returns `Ok(None)` when the document is absent.
    pub async fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMMENTS)
            .obj()
            .one(comment_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
