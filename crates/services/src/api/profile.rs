use reqwest::Method;
use toeic_core::FetchError;
use toeic_core::model::{ProfileUpdate, UserAchievement, UserGoal, UserId, UserProfile, newest_first};

use super::ApiClient;

/// Profile, goals and achievements kept by the progress service.
#[derive(Clone, Debug)]
pub struct ProfileApi {
    api: ApiClient,
}

#[allow(clippy::missing_errors_doc)]
impl ProfileApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `None` until the service has created a profile row.
    pub async fn profile(&self, user_id: UserId) -> Result<Option<UserProfile>, FetchError> {
        match self.api.get_json(&format!("profiles/{user_id}")).await {
            Ok(profile) => Ok(Some(profile)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, FetchError> {
        self.api
            .send_json(Method::PUT, &format!("profiles/{user_id}"), update)
            .await
    }

    pub async fn goals(&self, user_id: UserId) -> Result<Vec<UserGoal>, FetchError> {
        self.api.get_json(&format!("user-goals/{user_id}")).await
    }

    /// Newest first, whatever order the server used.
    pub async fn achievements(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserAchievement>, FetchError> {
        let mut achievements: Vec<UserAchievement> = self
            .api
            .get_json(&format!("user-achievements/{user_id}"))
            .await?;
        newest_first(&mut achievements);
        Ok(achievements)
    }
}
