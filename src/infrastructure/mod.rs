pub mod cached_oracle;
pub mod quote_client;
