// SPDX-License-Identifier: MIT

//! Friendship operations: requests, responses, lookups, user search.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::profile::rank_search_results;
use crate::models::{
    friendship_id, FriendRequestView, Friendship, FriendshipStatus, UserProfile, UserSummary,
};
use crate::time_utils::format_utc_rfc3339;

/// Result cap for user search.
const SEARCH_RESULT_LIMIT: usize = 20;

impl FirestoreDb {
    /// Send a friend request from `sender_id` to `receiver_id`.
    ///
    /// A friendship document in any status blocks a new request; a rejected
    /// request must be removed before the pair can try again.
    pub async fn send_friend_request(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Friendship, AppError> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }

        let receiver = self
            .get_user_profile(receiver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} does not exist", receiver_id)))?;

        if !receiver.privacy_settings.allow_friend_requests {
            return Err(AppError::PermissionDenied(
                "This user is not accepting friend requests".to_string(),
            ));
        }

        let id = friendship_id(sender_id, receiver_id);
        if self.get_friendship(&id).await?.is_some() {
            return Err(AppError::BadRequest(
                "A friendship or pending request already exists".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let friendship = Friendship {
            id: id.clone(),
            users: vec![sender_id.to_string(), receiver_id.to_string()],
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FRIENDSHIPS)
            .document_id(&id)
            .object(&friendship)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(sender = sender_id, receiver = receiver_id, "Friend request sent");
        Ok(friendship)
    }

    /// Accept or reject a pending request. Only the receiver may respond.
    pub async fn respond_to_friend_request(
        &self,
        request_id: &str,
        responding_user: &str,
        accept: bool,
    ) -> Result<Friendship, AppError> {
        let mut friendship = self.get_friendship(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Friend request {} does not exist", request_id))
        })?;

        if friendship.receiver_id != responding_user {
            return Err(AppError::PermissionDenied(
                "Only the receiver can respond to a friend request".to_string(),
            ));
        }

        friendship.status = if accept {
            FriendshipStatus::Accepted
        } else {
            FriendshipStatus::Rejected
        };
        friendship.updated_at = chrono::Utc::now();

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["status", "updated_at"])
            .in_col(collections::FRIENDSHIPS)
            .document_id(request_id)
            .object(&friendship)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(friendship)
    }

    /// Remove the friendship between the pair, whatever its status.
    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> Result<(), AppError> {
        let id = friendship_id(user_id, friend_id);
        if self.get_friendship(&id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "No friendship between {} and {}",
                user_id, friend_id
            )));
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FRIENDSHIPS)
            .document_id(&id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user = user_id, friend = friend_id, "Friendship removed");
        Ok(())
    }

    /// IDs of all accepted friends of `user_id`.
    pub async fn friend_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let uid = user_id.to_string();
        let friendships: Vec<Friendship> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FRIENDSHIPS)
            .filter(move |q| {
                q.for_all([
                    q.field("users").array_contains(uid.clone()),
                    q.field("status").eq("accepted"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(friendships
            .iter()
            .filter_map(|f| f.other_user(user_id))
            .map(str::to_string)
            .collect())
    }

    /// Pending requests addressed to `user_id`, enriched with each sender's
    /// display info. A missing sender profile degrades to placeholder text
    /// rather than dropping the request.
    pub async fn friend_requests(
        &self,
        user_id: &str,
    ) -> Result<Vec<FriendRequestView>, AppError> {
        let uid = user_id.to_string();
        let pending: Vec<Friendship> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FRIENDSHIPS)
            .filter(move |q| {
                q.for_all([
                    q.field("receiver_id").eq(uid.clone()),
                    q.field("status").eq("pending"),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut views = Vec::with_capacity(pending.len());
        for friendship in pending {
            let sender = self.get_user_profile(&friendship.sender_id).await?;
            let (display_name, photo_url) = match sender {
                Some(profile) => (profile.display_name, profile.photo_url),
                None => ("Unknown user".to_string(), String::new()),
            };
            views.push(FriendRequestView {
                id: friendship.id,
                sender_id: friendship.sender_id,
                receiver_id: friendship.receiver_id,
                status: friendship.status,
                display_name,
                photo_url,
                created_at: format_utc_rfc3339(friendship.created_at),
            });
        }

        Ok(views)
    }

    /// Current status of the pair's friendship, if a document exists.
    pub async fn friendship_status(
        &self,
        user_id: &str,
        other_id: &str,
    ) -> Result<Option<FriendshipStatus>, AppError> {
        let id = friendship_id(user_id, other_id);
        Ok(self.get_friendship(&id).await?.map(|f| f.status))
    }

    /// Search users by display name, case-insensitive substring match,
    /// excluding the caller, ranked by relevance.
    ///
    /// Firestore has no substring queries, so this scans the users
    /// collection and filters in memory. Fine at current user counts.
    pub async fn search_users(
        &self,
        query: &str,
        requesting_user: &str,
    ) -> Result<Vec<UserSummary>, AppError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(vec![]);
        }

        let users: Vec<UserProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut results: Vec<UserSummary> = users
            .into_iter()
            .filter(|u| u.id != requesting_user)
            .filter(|u| u.display_name.to_lowercase().contains(&needle))
            .map(|u| UserSummary {
                id: u.id,
                display_name: u.display_name,
                photo_url: u.photo_url,
            })
            .collect();

        rank_search_results(&mut results, &needle);
        results.truncate(SEARCH_RESULT_LIMIT);
        Ok(results)
    }

    async fn get_friendship(&self, id: &str) -> Result<Option<Friendship>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FRIENDSHIPS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
