use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::domain::reset::{Clock, SystemClock};
use crate::services::{
    AuthService, CommentService, ImageService, LettreMailer, Mailer, PasswordResetService,
    RecipeService, SeaOrmAuthService, SeaOrmCommentService, SeaOrmPasswordResetService,
    SeaOrmRecipeService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub image_service: Arc<ImageService>,

    pub auth_service: Arc<dyn AuthService>,

    pub reset_service: Arc<dyn PasswordResetService>,

    pub recipe_service: Arc<dyn RecipeService>,

    pub comment_service: Arc<dyn CommentService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = Arc::new(LettreMailer::new(&config.mail)?) as Arc<dyn Mailer>;
        Self::with_components(config, mailer, Arc::new(SystemClock)).await
    }

    /// Wires every service around one store, with the mail transport and
    /// clock supplied by the caller.
    pub async fn with_components(
        config: Config,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let image_service = Arc::new(ImageService::new(&config.general.uploads_path));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let reset_service = Arc::new(SeaOrmPasswordResetService::new(
            store.clone(),
            mailer,
            clock,
            config.security.clone(),
            config.server.public_url.clone(),
        )) as Arc<dyn PasswordResetService>;

        let recipe_service = Arc::new(SeaOrmRecipeService::new(
            store.clone(),
            image_service.clone(),
        )) as Arc<dyn RecipeService>;

        let comment_service =
            Arc::new(SeaOrmCommentService::new(store.clone())) as Arc<dyn CommentService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            image_service,
            auth_service,
            reset_service,
            recipe_service,
            comment_service,
        })
    }
}
