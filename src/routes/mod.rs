pub(crate) mod alarms;
pub(crate) mod alerts;
pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod locations;
pub(crate) mod router;
