// handlers/protected/mod.rs - Admin handlers behind the access gate
//
// The gate has already verified the session and inserted it into the request
// extensions before any of these run.
pub mod dashboard;
pub mod logout;

pub use dashboard::dashboard;
pub use logout::logout;
