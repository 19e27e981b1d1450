pub mod delete;
pub mod fetch;
pub mod health;
pub mod sign;
pub mod upload;
