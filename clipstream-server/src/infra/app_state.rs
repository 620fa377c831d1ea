use std::{fmt, sync::Arc};

use sqlx::PgPool;

use clipstream_core::auth::{AuthCrypto, SessionManager, TokenCodec};
use clipstream_core::comments::CommentRepository;
use clipstream_core::likes::LikeRepository;
use clipstream_core::media::MediaHost;
use clipstream_core::playlists::PlaylistRepository;
use clipstream_core::posts::PostRepository;
use clipstream_core::subscriptions::SubscriptionRepository;
use clipstream_core::users::store::PostgresUserStore;
use clipstream_core::videos::VideoRepository;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub sessions: Arc<SessionManager>,
    pub users: Arc<PostgresUserStore>,
    pub videos: Arc<VideoRepository>,
    pub comments: Arc<CommentRepository>,
    pub likes: Arc<LikeRepository>,
    pub playlists: Arc<PlaylistRepository>,
    pub subscriptions: Arc<SubscriptionRepository>,
    pub posts: Arc<PostRepository>,
    pub media_host: Arc<dyn MediaHost>,
    pub crypto: AuthCrypto,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(config: Config, pool: PgPool, media_host: Arc<dyn MediaHost>) -> Self {
        let crypto = AuthCrypto::new();
        let users = Arc::new(PostgresUserStore::new(pool.clone()));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(PostgresUserStore::new(pool.clone())),
            TokenCodec::new(&config.token_settings()),
            crypto.clone(),
        ));

        Self {
            config: Arc::new(config),
            sessions,
            users,
            videos: Arc::new(VideoRepository::new(pool.clone())),
            comments: Arc::new(CommentRepository::new(pool.clone())),
            likes: Arc::new(LikeRepository::new(pool.clone())),
            playlists: Arc::new(PlaylistRepository::new(pool.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(pool.clone())),
            posts: Arc::new(PostRepository::new(pool.clone())),
            media_host,
            crypto,
            pool,
        }
    }
}
