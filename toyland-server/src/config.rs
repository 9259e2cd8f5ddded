//! Store connection configuration

/// Atlas cluster the toy collection lives on.
pub const DEFAULT_CLUSTER_HOST: &str = "cluster0.kgqetuh.mongodb.net";

/// Database holding the toy collection.
pub const DEFAULT_DATABASE: &str = "toyLand";

/// Collection holding toy documents.
pub const DEFAULT_COLLECTION: &str = "toys";

/// Document store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub user: String,
    pub password: String,
    pub cluster_host: String,
    pub database: String,
    pub collection: String,

    /// Full connection string. Replaces the one built from the credentials
    /// and cluster host when set.
    pub uri_override: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            cluster_host: DEFAULT_CLUSTER_HOST.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            uri_override: None,
        }
    }
}

impl StoreConfig {
    /// Config for the default cluster with the given credentials.
    pub fn with_credentials(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Connection string used to reach the store.
    ///
    /// Credentials are inserted verbatim.
    pub fn connection_uri(&self) -> String {
        match &self.uri_override {
            Some(uri) => uri.clone(),
            None => format!(
                "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
                self.user, self.password, self.cluster_host
            ),
        }
    }
}
