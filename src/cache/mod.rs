pub mod active_token;
