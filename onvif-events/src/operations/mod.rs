//! Event service operations

pub mod create_pull_point_subscription;
pub mod pull_messages;
pub mod unsubscribe;

pub use create_pull_point_subscription::{
    CreatePullPointSubscriptionOperation, CreatePullPointSubscriptionRequest,
    CreatePullPointSubscriptionResponse,
};
pub use pull_messages::{PullMessagesOperation, PullMessagesRequest, PullMessagesResponse};
pub use unsubscribe::{UnsubscribeOperation, UnsubscribeRequest, UnsubscribeResponse};
