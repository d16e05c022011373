pub mod reasoning_client;
pub mod search_client;
