pub mod bson;
pub mod discord;
pub mod events;
pub mod time;
