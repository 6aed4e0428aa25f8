pub mod backend;
pub mod error;
pub mod identity;
pub mod pod;
pub mod server;
pub mod translate;
