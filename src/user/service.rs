use std::sync::Arc;

use super::Sub;
use super::model::{DisplayInfo, User};
use super::repository::UserRepository;

#[derive(Clone)]
pub struct UserService {
    repository: Arc<UserRepository>,
}

impl UserService {
    pub fn new(repository: UserRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

impl UserService {
    pub async fn upsert(&self, user: &User) -> super::Result<()> {
        self.repository.upsert(user).await
    }

    /// Display enrichment for message notifications. A sender missing from
    /// the directory degrades to their raw identifier instead of failing
    /// the send.
    pub async fn find_display_info(&self, sub: &Sub) -> super::Result<DisplayInfo> {
        let info = self
            .repository
            .find_by_sub(sub)
            .await?
            .map(DisplayInfo::from)
            .unwrap_or_else(|| DisplayInfo::raw(sub));

        Ok(info)
    }
}
