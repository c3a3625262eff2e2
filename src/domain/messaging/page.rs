//! Windowing over a conversation's message log.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ValidationError};

use super::Message;

/// Largest window a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated page request. Page 1 is the newest window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// # Errors
    ///
    /// - `ValidationFailed` if `page < 1` or `page_size` is outside `[1, 100]`
    pub fn new(page: u32, page_size: u32) -> Result<Self, DomainError> {
        if page < 1 {
            return Err(
                ValidationError::out_of_range("page", 1, i64::from(u32::MAX), i64::from(page))
                    .into(),
            );
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ValidationError::out_of_range(
                "limit",
                1,
                i64::from(MAX_PAGE_SIZE),
                i64::from(page_size),
            )
            .into());
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of newest messages to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// One window of history, oldest-first within the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

impl MessagePage {
    /// Build a page from a newest-first slice as returned by the store.
    pub fn from_newest_first(mut newest_first: Vec<Message>, request: PageRequest) -> Self {
        newest_first.reverse();
        let has_more = newest_first.len() == request.page_size() as usize;
        Self {
            messages: newest_first,
            page: request.page(),
            page_size: request.page_size(),
            has_more,
        }
    }
}
