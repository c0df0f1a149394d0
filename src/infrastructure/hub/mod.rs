mod hub_fetcher;

pub use hub_fetcher::{HUB_ENDPOINT, HubFetcher};
