pub mod dynamodb;
pub mod http;
pub mod persistence;
