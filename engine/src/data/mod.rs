// Snapshot ingestion: storage gateway, CSV decoding, fetching and series merging.
pub mod csv_parser;
pub mod fetcher;
pub mod gateway;
pub mod market_data;
