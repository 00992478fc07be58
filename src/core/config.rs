use std::env;

/// Store settings read from the environment.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Name of the single table holding every entity.
    pub table: String,
    /// Endpoint override for DynamoDB Local; unset in production.
    pub endpoint: Option<String>,
}

impl StoreConfig {
    /// # Errors
    ///
    /// Returns an error naming the variable when `DYNAMODB_TABLE` is unset.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            table: env::var("DYNAMODB_TABLE").map_err(|e| format!("DYNAMODB_TABLE: {}", e))?,
            endpoint: env::var("DYNAMODB_ENDPOINT").ok(),
        })
    }
}
