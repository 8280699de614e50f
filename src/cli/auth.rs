use crate::{config::Config, error, info, spotify, success};

pub async fn auth() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };

    info!("Waiting for authorization on {} ...", config.redirect_uri);
    match spotify::auth::login(&config).await {
        Ok(_) => success!(
            "Authentication successful! Token saved to {}",
            config.token_path().display()
        ),
        Err(e) => error!("Authentication failed: {}", e),
    }
}
