//! Messaging limits applied at the transport boundary.

use serde::Deserialize;

use crate::domain::messaging::MAX_PAGE_SIZE;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Longest accepted message body, in characters
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Page size used when a request omits `limit`
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound on `limit`; never above the core maximum of 100
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl MessagingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_content_length == 0 {
            return Err(ValidationError::InvalidMessagingLimit("max_content_length"));
        }
        if self.max_page_size == 0 || self.max_page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidMessagingLimit("max_page_size"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ValidationError::InvalidMessagingLimit("default_page_size"));
        }
        Ok(())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_max_content_length() -> usize {
    5000
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}
