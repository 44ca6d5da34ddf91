mod user_profile;

pub use user_profile::{CreateUserProfile, UpdateUserProfile, UserProfile};
