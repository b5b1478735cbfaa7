mod crypto;
mod db;
mod extractor;

pub use crypto::{hash_password, verify_password};
pub use db::{create_session, get_user_from_refresh_token, issue_token_pair, SessionKind};
pub use extractor::{AuthUser, Caller};
