//! Business logic and outbound messaging

pub mod feedback;
pub mod notification;
pub mod payment_confirmation;
pub mod twilio;
pub mod whatsapp;

pub use feedback::FeedbackService;
pub use notification::{build_notifier, FeedbackNotifier, NotificationError};
pub use payment_confirmation::PaymentConfirmationService;
