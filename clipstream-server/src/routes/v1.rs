use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::{
    comments, likes, playlists, posts, subscriptions,
    infra::app_state::AppState,
    users::{self, middleware::require_auth},
    videos,
};

/// Create all v1 API routes.
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public endpoints
        .route("/users/register", post(users::handlers::register))
        .route("/users/login", post(users::handlers::login))
        .route("/users/refresh-token", post(users::handlers::refresh_token))
        .route("/videos", get(videos::handlers::list_videos))
        .route("/videos/{id}", get(videos::handlers::get_video))
        .route(
            "/comments/video/{video_id}",
            get(comments::handlers::list_comments),
        )
        .route(
            "/subscriptions/channel/{channel_id}",
            get(subscriptions::handlers::channel_subscribers),
        )
        .route(
            "/subscriptions/user/{subscriber_id}",
            get(subscriptions::handlers::subscribed_channels),
        )
        .route("/posts/user/{user_id}", get(posts::handlers::user_posts))
        .route(
            "/playlists/user/{user_id}",
            get(playlists::handlers::user_playlists),
        )
        .route("/playlists/{id}", get(playlists::handlers::get_playlist))
        // Everything below requires a verified access token
        .merge(create_protected_routes(state))
}

fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Session endpoints
        .route("/users/logout", post(users::handlers::logout))
        .route("/users/current-user", get(users::handlers::current_user))
        .route(
            "/users/change-password",
            post(users::handlers::change_password),
        )
        .route(
            "/users/channel/{username}",
            get(users::handlers::channel_profile),
        )
        // Video management
        .route("/videos", post(videos::handlers::publish_video))
        .route("/videos/{id}", patch(videos::handlers::update_video))
        .route("/videos/{id}", delete(videos::handlers::delete_video))
        .route(
            "/videos/{id}/toggle-publish",
            post(videos::handlers::toggle_publish),
        )
        // Comments
        .route(
            "/comments/video/{video_id}",
            post(comments::handlers::add_comment),
        )
        // Likes
        .route(
            "/likes/toggle/video/{video_id}",
            post(likes::handlers::toggle_video_like),
        )
        .route(
            "/likes/toggle/comment/{comment_id}",
            post(likes::handlers::toggle_comment_like),
        )
        .route(
            "/likes/toggle/post/{post_id}",
            post(likes::handlers::toggle_post_like),
        )
        .route("/likes/videos", get(likes::handlers::liked_videos))
        // Subscriptions
        .route(
            "/subscriptions/channel/{channel_id}",
            post(subscriptions::handlers::toggle_subscription),
        )
        // Playlists
        .route("/playlists", post(playlists::handlers::create_playlist))
        .route(
            "/playlists/{id}/videos",
            patch(playlists::handlers::add_video),
        )
        .route(
            "/playlists/{id}/videos",
            delete(playlists::handlers::remove_video),
        )
        .route("/playlists/{id}", patch(playlists::handlers::update_playlist))
        .route(
            "/playlists/{id}",
            delete(playlists::handlers::delete_playlist),
        )
        // Posts
        .route("/posts", post(posts::handlers::create_post))
        .route("/posts/{id}", patch(posts::handlers::update_post))
        .route("/posts/{id}", delete(posts::handlers::delete_post))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
