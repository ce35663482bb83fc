use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Customer '{customer_id}' exceeded the step limit of {limit} without reaching a terminal stage")]
    StepLimitExceeded { customer_id: String, limit: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    /// True when the failure only invalidates the current customer's
    /// simulation and the run should carry on with the next customer.
    pub fn is_customer_fatal(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }
}

pub type SimResult<T> = Result<T, SimError>;
