// Handlers module

pub mod chat;
pub mod copilotkit;
pub mod status;
pub mod ws_chat;

pub use chat::chat_handler;
pub use copilotkit::copilotkit_handler;
pub use status::{health_handler, root_handler};
pub use ws_chat::ws_chat_handler;
