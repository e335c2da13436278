pub mod outcome;
pub mod provider;
pub mod request;
