pub(crate) mod auth;
pub(crate) mod format;
pub(crate) mod ratelimiter;
