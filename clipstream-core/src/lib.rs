//! # Clipstream Core
//!
//! Domain layer for the clipstream media-sharing backend.
//!
//! ## Overview
//!
//! `clipstream-core` carries everything below the HTTP boundary:
//!
//! - **Session & token lifecycle**: credential verification, dual-token
//!   issuance (short-lived access / long-lived refresh), refresh rotation
//!   with persisted-token matching, and logout revocation
//! - **User system**: account records, public profiles, and the
//!   credential-store contract with its Postgres implementation
//! - **Resource stores**: videos, comments, likes, playlists,
//!   subscriptions, and posts
//! - **Collaborator contracts**: the external media host used for avatar,
//!   thumbnail, and video uploads
//!
//! ## Architecture
//!
//! The crate is organized into a few key modules:
//!
//! - [`auth`]: the session manager, token codec, and password crypto
//! - [`users`]: user records and the [`users::store::UserStore`] contract
//! - [`media`]: the upload collaborator boundary
//! - [`api_types`]: the response envelope shared across API boundaries

pub mod api_types;
pub mod auth;
pub mod comments;
pub mod error;
pub mod likes;
pub mod media;
pub mod playlists;
pub mod posts;
pub mod subscriptions;
pub mod users;
pub mod videos;

pub use error::{Result, StoreError};
