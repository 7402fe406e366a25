//! Authentication routes.
//!
//! Sign-in itself happens against the user pool's hosted UI; the API only
//! offers self-service registration. Claims for signed-in users are
//! resolved by the post-authentication trigger, not here.

pub mod signup;

pub use signup::{MIN_PASSWORD_LENGTH, SignUpForm, SignUpService, signup};
