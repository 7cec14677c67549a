use serde::{Deserialize, Serialize};

use super::post::PostId;

/// How far a reader has got through a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    #[default]
    Unread,
    Reading,
    Completed,
}

impl ReadingStatus {
    /// Status implied by a progress percentage.
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            0 => ReadingStatus::Unread,
            100.. => ReadingStatus::Completed,
            _ => ReadingStatus::Reading,
        }
    }
}

/// One entry of the stored reading history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryEntry {
    pub post_id: PostId,
    pub status: ReadingStatus,
    /// Percentage read, 0..=100.
    pub progress: u8,
    /// Epoch milliseconds of the last update.
    pub timestamp: i64,
}
