use async_trait::async_trait;

use crate::domain::plate::Plate;
use crate::errors::UpstreamError;

/// Member-profile lookup boundary. Consulted only when no plate can be
/// extracted from the user's utterance.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// All plates bound to the member's account, possibly empty.
    async fn bound_plates(&self, user_id: &str) -> Result<Vec<Plate>, UpstreamError>;
}
