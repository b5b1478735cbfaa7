pub mod create_user;
pub mod refresh;
pub mod token;
