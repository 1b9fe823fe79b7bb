// SPDX-License-Identifier: MIT

//! Typed pin operations: CRUD, visibility queries, check-in.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::pin::{filter_active, merge_by_id, sort_newest_first};
use crate::models::{Pin, PinDraft, PinPatch};

impl FirestoreDb {
    /// Create a new pin owned by `owner_id`. Returns the stored pin.
    ///
    /// Notification fan-out to the visible-to set happens at the caller so a
    /// push failure can never fail the write.
    pub async fn create_pin(&self, owner_id: &str, draft: PinDraft) -> Result<Pin, AppError> {
        let now = chrono::Utc::now();
        let pin = Pin {
            id: uuid::Uuid::new_v4().simple().to_string(),
            created_by: owner_id.to_string(),
            location: draft.location,
            title: draft.title,
            note: draft.note,
            address: draft.address,
            hangout_time: draft.hangout_time,
            expires_at: draft.expires_at,
            visible_to: draft.visible_to,
            checked_in_users: vec![],
            created_at: now,
            updated_at: now,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LOCATION_PINS)
            .document_id(&pin.id)
            .object(&pin)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(pin_id = %pin.id, owner = owner_id, "Pin created");
        Ok(pin)
    }

    /// Merge the provided fields into an existing pin, stamping `updated_at`.
    pub async fn update_pin(&self, pin_id: &str, patch: &PinPatch) -> Result<Pin, AppError> {
        let mut pin = self
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", pin_id)))?;

        patch.apply(&mut pin, chrono::Utc::now());

        let mut fields = patch.changed_fields();
        fields.push("updated_at");

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::LOCATION_PINS)
            .document_id(pin_id)
            .object(&pin)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(pin)
    }

    /// Delete a pin. Only the owner may delete; comments are not cascaded
    /// (they are pruned individually by their authors).
    pub async fn delete_pin(&self, pin_id: &str, requesting_user: &str) -> Result<(), AppError> {
        let pin = self
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", pin_id)))?;

        if pin.created_by != requesting_user {
            return Err(AppError::PermissionDenied(
                "Only the pin owner can delete it".to_string(),
            ));
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LOCATION_PINS)
            .document_id(pin_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(pin_id, owner = requesting_user, "Pin deleted");
        Ok(())
    }

    /// Get a pin by ID. Returns `Ok(None)` when the document is absent.
    pub async fn get_pin(&self, pin_id: &str) -> Result<Option<Pin>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOCATION_PINS)
            .obj()
            .one(pin_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All pins visible to `user_id`.
    ///
    /// The creator is not automatically a member of their own `visible_to`
    /// array, so this is the union of an array-membership query and a
    /// created-by query, merged by id to keep each pin exactly once.
    pub async fn pins_visible_to(&self, user_id: &str) -> Result<Vec<Pin>, AppError> {
        let client = self.get_client()?;

        let uid = user_id.to_string();
        let visible_query = client
            .fluent()
            .select()
            .from(collections::LOCATION_PINS)
            .filter(move |q| q.for_all([q.field("visible_to").array_contains(uid.clone())]))
            .obj::<Pin>()
            .query();

        let uid = user_id.to_string();
        let owned_query = client
            .fluent()
            .select()
            .from(collections::LOCATION_PINS)
            .filter(move |q| q.for_all([q.field("created_by").eq(uid.clone())]))
            .obj::<Pin>()
            .query();

        let (visible, owned) = tokio::try_join!(visible_query, owned_query)
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            user_id,
            visible = visible.len(),
            owned = owned.len(),
            "Visibility queries merged"
        );

        Ok(merge_by_id(visible, owned))
    }

    /// Pins active for `user_id` right now: the user's own pins always, other
    /// visible pins only while unexpired.
    pub async fn active_pins(&self, user_id: &str) -> Result<Vec<Pin>, AppError> {
        let all = self.pins_visible_to(user_id).await?;
        Ok(filter_active(all, user_id, chrono::Utc::now()))
    }

    /// Pins created by `user_id`, newest first. Expired pins are included;
    /// the "My Hangouts" view filters by activity state itself.
    pub async fn pins_by_user(&self, user_id: &str) -> Result<Vec<Pin>, AppError> {
        let client = self.get_client()?;

        let uid = user_id.to_string();
        let ordered = client
            .fluent()
            .select()
            .from(collections::LOCATION_PINS)
            .filter(move |q| q.for_all([q.field("created_by").eq(uid.clone())]))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj::<Pin>()
            .query()
            .await;

        match ordered {
            Ok(pins) => Ok(pins),
            Err(e) => {
                // A composite index may not exist yet; retry unordered and
                // sort in memory by the same key.
                tracing::warn!(
                    error = %e,
                    user_id,
                    "Ordered pin query failed, falling back to in-memory sort"
                );

                let uid = user_id.to_string();
                let mut pins: Vec<Pin> = client
                    .fluent()
                    .select()
                    .from(collections::LOCATION_PINS)
                    .filter(move |q| q.for_all([q.field("created_by").eq(uid.clone())]))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                sort_newest_first(&mut pins);
                Ok(pins)
            }
        }
    }

    /// Pins created by `friend_id` that `user_id` is allowed to see.
    pub async fn friend_pins(&self, user_id: &str, friend_id: &str) -> Result<Vec<Pin>, AppError> {
        let uid = user_id.to_string();
        let fid = friend_id.to_string();

        self.get_client()?
            .fluent()
            .select()
            .from(collections::LOCATION_PINS)
            .filter(move |q| {
                q.for_all([
                    q.field("created_by").eq(fid.clone()),
                    q.field("visible_to").array_contains(uid.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add `user_id` to the pin's checked-in set. No-op if already present.
    /// Only users the pin is visible to may check in.
    ///
    /// Read-modify-write on the whole array: concurrent check-ins from other
    /// devices race and the last full-array write wins.
    pub async fn check_in(&self, pin_id: &str, user_id: &str) -> Result<Pin, AppError> {
        let mut pin = self
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", pin_id)))?;

        if !pin.is_visible_to(user_id) {
            return Err(AppError::PermissionDenied(
                "You cannot see this pin".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        if pin.is_expired(now) && pin.created_by != user_id {
            return Err(AppError::PermissionDenied(
                "This hangout has expired".to_string(),
            ));
        }

        if pin.is_checked_in(user_id) {
            return Ok(pin);
        }

        pin.checked_in_users.push(user_id.to_string());
        pin.updated_at = now;
        self.write_checked_in(&pin).await?;

        Ok(pin)
    }

    /// Remove `user_id` from the pin's checked-in set. No-op if absent.
    pub async fn check_out(&self, pin_id: &str, user_id: &str) -> Result<Pin, AppError> {
        let mut pin = self
            .get_pin(pin_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", pin_id)))?;

        if !pin.is_checked_in(user_id) {
            return Ok(pin);
        }

        pin.checked_in_users.retain(|id| id != user_id);
        pin.updated_at = chrono::Utc::now();
        self.write_checked_in(&pin).await?;

        Ok(pin)
    }

    async fn write_checked_in(&self, pin: &Pin) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["checked_in_users", "updated_at"])
            .in_col(collections::LOCATION_PINS)
            .document_id(&pin.id)
            .object(pin)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
