pub mod prelude;

pub mod comments;
pub mod ingredients;
pub mod recipes;
pub mod users;
