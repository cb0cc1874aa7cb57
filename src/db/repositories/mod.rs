pub mod comment;
pub mod recipe;
pub mod user;
