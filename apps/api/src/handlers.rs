pub mod access;
pub mod analysis;
pub mod documents;
pub mod health;
pub mod users;
