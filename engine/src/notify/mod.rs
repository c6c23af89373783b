// Digest composition and delivery
pub mod composer;
pub mod notifier;

pub use composer::{compose_digest, DigestMessage, DigestOutcome};
pub use notifier::{LogNotifier, Notifier, WhatsAppNotifier};
