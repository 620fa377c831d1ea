//! Authentication core: credential verification, dual-token issuance,
//! refresh rotation, and logout revocation.

pub mod crypto;
pub mod session;
pub mod tokens;

pub use crypto::AuthCrypto;
pub use session::{AuthError, LoginOutcome, SessionManager, TokenPair};
pub use tokens::{Claims, TokenCodec, TokenKind, TokenSettings};
