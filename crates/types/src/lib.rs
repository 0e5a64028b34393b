pub mod catalog;
pub mod gateway;
pub mod policy;
pub mod webhook;

pub use catalog::{CryptoAsset, Plan, PlanType};
pub use policy::{PlanChange, decide};
pub use webhook::{ActivationCommand, GatewayNotification, PaymentMetadata, PaymentObject};
