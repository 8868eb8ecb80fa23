use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

/// A business operation that writes through its own transaction and
/// publishes its events once committed.
#[async_trait]
pub trait Command: Send + Sync {
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod purchaseorders;
pub mod quoterequests;
pub mod suppliers;
