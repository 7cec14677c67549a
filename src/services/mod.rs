// Blogshelf services
// Stateless or capability-style building blocks: storage, dataset fetching,
// normalization, querying, sample data and settings.

pub mod fetch_source;
pub mod normalizer;
pub mod post_query;
pub mod sample_data;
pub mod settings_engine;
pub mod storage;
