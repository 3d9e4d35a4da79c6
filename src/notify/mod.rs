mod channel;
mod digest;
mod dispatcher;
mod keyed_http;
mod telegram;
mod whatsapp_session;

pub use channel::{NotificationChannel, SendFailure};
pub use digest::DigestOptions;
pub use dispatcher::{DispatchResult, Dispatcher};
pub use keyed_http::{KeyedHttpChannel, KeyedProvider};
pub use telegram::TelegramChannel;
pub use whatsapp_session::WhatsAppSessionChannel;
