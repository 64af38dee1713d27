use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

const APP_NAME: &str = "docquiz-server";

/// Handle on the application database. Cloning shares the client's pool.
#[derive(Clone)]
pub struct Database {
    database: mongodb::Database,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;
        apply_pool_settings(&mut client_options, config);

        let client = Client::with_options(client_options)?;
        let database = Self {
            database: client.database(&config.mongo_db_name),
        };
        database.health_check().await?;

        log::info!(
            "Connected to MongoDB database '{}' (pool {}..{})",
            config.mongo_db_name,
            config.mongo_min_pool_size.min(config.mongo_max_pool_size),
            config.mongo_max_pool_size
        );
        Ok(database)
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.database.collection(name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

fn apply_pool_settings(options: &mut ClientOptions, config: &Config) {
    options.app_name = Some(APP_NAME.to_string());
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.max_pool_size = Some(config.mongo_max_pool_size);
    options.min_pool_size = Some(config.mongo_min_pool_size.min(config.mongo_max_pool_size));
    options.connect_timeout = Some(Duration::from_secs(config.mongo_connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.mongo_server_selection_timeout_secs));
}
