pub mod crop;
pub mod domain;
pub mod error;
pub mod protocol;
