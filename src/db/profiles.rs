// SPDX-License-Identifier: MIT

//! User profile operations.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::{PrivacyPatch, ProfilePatch, UserProfile};

impl FirestoreDb {
    /// Create a profile document keyed by the authenticated user's ID.
    /// Overwrites any existing document for the same user.
    pub async fn create_user_profile(
        &self,
        user_id: &str,
        display_name: String,
        email: String,
        photo_url: String,
    ) -> Result<UserProfile, AppError> {
        let now = chrono::Utc::now();
        let profile = UserProfile {
            id: user_id.to_string(),
            display_name,
            email,
            photo_url,
            location: String::new(),
            push_token: None,
            preferences: Default::default(),
            privacy_settings: Default::default(),
            created_at: now,
            updated_at: now,
            last_active: now,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id, "User profile created");
        Ok(profile)
    }

    /// Get a profile by user ID. Returns `Ok(None)` when the document is
    /// absent, so callers can tell "no profile yet" from a fetch failure.
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Merge the provided fields into an existing profile.
    pub async fn update_user_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> Result<UserProfile, AppError> {
        let mut profile = self
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} does not exist", user_id)))?;

        patch.apply(&mut profile, chrono::Utc::now());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(profile)
    }

    /// Merge the provided privacy toggles onto the stored settings.
    pub async fn update_privacy_settings(
        &self,
        user_id: &str,
        patch: &PrivacyPatch,
    ) -> Result<UserProfile, AppError> {
        let mut profile = self
            .get_user_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} does not exist", user_id)))?;

        patch.apply(&mut profile.privacy_settings);
        profile.updated_at = chrono::Utc::now();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["privacy_settings", "updated_at"])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(profile)
    }

    /// Stamp `last_active`. Called on authenticated traffic; failures are
    /// logged by the caller and never surfaced to the request.
    pub async fn update_last_active(&self, user_id: &str) -> Result<(), AppError> {
        let mut profile = match self.get_user_profile(user_id).await? {
            Some(profile) => profile,
            // No profile yet (first sign-in); nothing to stamp.
            None => return Ok(()),
        };

        profile.last_active = chrono::Utc::now();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["last_active"])
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete a profile document.
    pub async fn delete_user_profile(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id, "User profile deleted");
        Ok(())
    }
}
