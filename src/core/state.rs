use crate::controllers::credentials::CredentialStore;
use crate::controllers::token::TokenController;
use crate::core::client::Client;
use crate::core::config::Args;
use crate::core::error::ConfigError;
use crate::token::store::TokenRegistry;
use crate::utils::ratelimiter::Ratelimiter;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) client: Client,
    pub(crate) token_controller: TokenController,
}

impl AppState {
    pub(crate) fn new(client: Client, token_controller: TokenController) -> Self {
        Self {
            client,
            token_controller,
        }
    }

    pub(crate) fn from_args(config: &Args) -> Result<Self, ConfigError> {
        let lifetime = config.token_lifetime()?;

        let ratelimiter = Ratelimiter::new(
            config.upstream_max_requests,
            std::time::Duration::from_secs(config.upstream_window_secs),
        );

        let client = Client::new(
            &config.smartcover_api_base,
            config.smartcover_jwt.clone(),
            std::time::Duration::from_secs(config.upstream_timeout_secs),
            ratelimiter,
        )?;

        let users = config.api_users();
        tracing::info!("Loaded {} API user(s)", users.len());
        let credentials = CredentialStore::new(users);

        let token_controller = TokenController::new(
            credentials,
            TokenRegistry::new(),
            &config.jwt_secret_key,
            lifetime,
        );

        Ok(Self::new(client, token_controller))
    }
}
