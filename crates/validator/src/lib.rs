// Pre-deploy checks: where the tool runs and which credential it gets

pub mod credentials;
pub mod entry_point;

pub use credentials::resolve_auth;
pub use entry_point::{FIREBASE_JSON, verify_entry_point};
