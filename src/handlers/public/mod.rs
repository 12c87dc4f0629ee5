// handlers/public/mod.rs - Public handlers (no session required)
//
// The access gate still sees these requests, but only forwards cookie
// mutations; it never redirects them.
pub mod login;
pub mod site;

pub use login::{login_form, login_submit};
pub use site::{health, root};
