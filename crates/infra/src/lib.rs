//! Infrastructure layer: storage and external service adapters.

pub mod finance;
pub mod inventory;
pub mod store;
pub mod webhook;

pub use finance::{FinanceLedger, InMemoryFinanceLedger};
pub use inventory::{InMemoryInventory, Inventory};
pub use store::{InMemoryRepository, Repository};
pub use webhook::{HttpWebhookClient, WebhookClient, WebhookError, WebhookReply, WebhookSettings};
