//! Composition root: configuration, storage and collaborators for one command.

use std::sync::Arc;

use anyhow::{Context, Result};
use daily_algorithm::auth::{ConsentMode, GoogleOAuth, InteractiveAuthenticator};
use daily_algorithm::config::default_config_dir;
use daily_algorithm::{
    load_or_default, AppPaths, Collaborators, Config, CredentialStore, Database,
    GoogleClientCredentials, Pipeline, PipelineConfig, TokenProvider,
};

pub struct App {
    pub config: Config,
    pub paths: AppPaths,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = load_or_default(default_config_dir()).context("Failed to load configuration")?;
        let paths = AppPaths::from_config(&config);
        Ok(Self { config, paths })
    }

    /// Creates the application directories and opens the job store.
    pub fn open_database(&self) -> Result<Database> {
        self.paths
            .ensure_directories()
            .context("Failed to create application directories")?;
        Database::open(&self.paths.database()).context("Failed to open the job database")
    }

    pub fn token_provider(&self, manual: bool) -> Result<Arc<TokenProvider>> {
        let credentials =
            GoogleClientCredentials::from_env().context("Google OAuth client is not configured")?;
        let oauth = GoogleOAuth::new(
            credentials.client_id,
            credentials.client_secret,
            self.config.callback_port,
        )?;

        let mode = if manual {
            ConsentMode::Manual
        } else {
            ConsentMode::Browser {
                port: self.config.callback_port,
            }
        };
        let authenticator = InteractiveAuthenticator::new(Arc::new(oauth), mode);

        Ok(Arc::new(TokenProvider::new(
            CredentialStore::new(self.paths.tokens()),
            Arc::new(authenticator),
        )))
    }

    pub fn collaborators(&self) -> Result<Collaborators> {
        Collaborators::production(&self.config).context("Failed to set up external services")
    }

    pub fn pipeline(&self, db: Database, cores: Option<usize>, upload: bool) -> Result<Pipeline> {
        let config = PipelineConfig::from_config(&self.config).with_concurrency(cores);
        let pipeline = Pipeline::new(Arc::new(config), db, self.collaborators()?);
        if upload {
            Ok(pipeline.with_publishing(self.token_provider(false)?))
        } else {
            Ok(pipeline)
        }
    }
}
