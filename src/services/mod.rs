pub mod ai;
pub mod booking;
pub mod chat;
