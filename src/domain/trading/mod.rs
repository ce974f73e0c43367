// Core trading domain entities and value objects
pub mod request;
pub mod types;
