pub mod admin;
pub mod health;
pub mod request_id;
pub mod usage;
pub mod users;
