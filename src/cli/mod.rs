pub mod chat;
pub mod doctor;

pub use chat::chat;
pub use doctor::doctor;
