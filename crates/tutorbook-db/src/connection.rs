//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

/// Connection settings for the SurrealDB instance backing the slot
/// store.
#[derive(Debug, Clone)]
pub struct DbSettings {
    /// WebSocket address (e.g. `127.0.0.1:8000`).
    pub address: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8000".into(),
            namespace: "tutorbook".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// Connect to SurrealDB, authenticate as root and select the
/// configured namespace and database.
pub async fn connect(settings: &DbSettings) -> Result<Surreal<Client>, surrealdb::Error> {
    info!(
        address = %settings.address,
        namespace = %settings.namespace,
        database = %settings.database,
        "Connecting to SurrealDB"
    );

    let db = Surreal::new::<Ws>(&settings.address).await?;

    db.signin(Root {
        username: settings.username.clone(),
        password: settings.password.clone(),
    })
    .await?;

    db.use_ns(&settings.namespace)
        .use_db(&settings.database)
        .await?;

    info!("SurrealDB connection established");

    Ok(db)
}
