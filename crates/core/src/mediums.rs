//! Delivery medium identifier constants.
//!
//! A medium is a delivery channel for a message. The in-app inbox itself is
//! not a medium — every message is an inbox item by definition; mediums are
//! the additional channels a message may fan out to.

/// Push notification to the user's registered device group.
pub const MEDIUM_APP_PUSH: &str = "app_push";

/// Plain-text email to the user's address.
pub const MEDIUM_EMAIL: &str = "email";

/// SMS (reserved; no backend is wired up).
pub const MEDIUM_SMS: &str = "sms";

/// Browser web push (reserved; no backend is wired up).
pub const MEDIUM_WEB_PUSH: &str = "web_push";

/// Every medium identifier the preference model knows about.
pub const KNOWN_MEDIUMS: [&str; 4] = [MEDIUM_APP_PUSH, MEDIUM_EMAIL, MEDIUM_SMS, MEDIUM_WEB_PUSH];

/// Mediums the fan-out pipeline can actually dispatch to.
///
/// `sms` and `web_push` exist in the preference model (with a `null` default,
/// meaning unsupported) but have no delivery backend.
pub const DISPATCHABLE_MEDIUMS: [&str; 2] = [MEDIUM_APP_PUSH, MEDIUM_EMAIL];
