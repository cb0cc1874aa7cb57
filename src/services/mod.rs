pub mod image;
pub use image::ImageService;

pub mod mail;
pub use mail::{LettreMailer, Mailer};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Registration, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod reset_service;
pub mod reset_service_impl;
pub use reset_service::{PasswordResetError, PasswordResetService, ResetIssued, TokenStatus};
pub use reset_service_impl::SeaOrmPasswordResetService;

pub mod recipe_service;
pub mod recipe_service_impl;
pub use recipe_service::{RecipeDetail, RecipeError, RecipeList, RecipeService};
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod comment_service;
pub mod comment_service_impl;
pub use comment_service::{CommentError, CommentService, CommentThread, PostedComment};
pub use comment_service_impl::SeaOrmCommentService;
