pub mod gate;
pub mod response;

pub use gate::{access_gate, AccessGate, GateError, RouteClass, VerifiedCookies};
pub use response::ApiResponse;
