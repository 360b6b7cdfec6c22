pub mod fixtures;
pub mod test_env;

// Re-export key testing utilities
pub use fixtures::{cassette_path, load_vcr_response, mount_cassette};
pub use test_env::{LiveResolver, TEST_TOKEN, TestApi, unreachable_client};
