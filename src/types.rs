//! Core identifier types for the document generation client.

use uuid::Uuid;

/// SubscriptionId: Logic subscription owning configurations and requests
pub type SubscriptionId = Uuid;

/// ConfigurationId: Server-assigned id of a document generation configuration
pub type ConfigurationId = Uuid;

/// EntryId: Server-assigned id of one template storage directory
pub type EntryId = Uuid;

/// RequestId: Id of a generation or conversion request
pub type RequestId = Uuid;

/// Server-side address of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigurationScope {
    pub subscription_id: SubscriptionId,
    pub configuration_id: ConfigurationId,
}

impl ConfigurationScope {
    pub fn new(subscription_id: SubscriptionId, configuration_id: ConfigurationId) -> Self {
        Self {
            subscription_id,
            configuration_id,
        }
    }
}
