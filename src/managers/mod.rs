// Blogshelf state managers
// Managers own mutable state: the post collection and the reading history.

pub mod post_manager;
pub mod reading_history_manager;
