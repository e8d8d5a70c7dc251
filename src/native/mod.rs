/// Native module contains implementations of core traits
/// that talk to the operating system directly.
pub mod executor;
