pub mod forums;
pub mod messages;
