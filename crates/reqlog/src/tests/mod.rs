//! Test module for reqlog
//!
//! Unit and property-based tests (proptest) for the context store, the
//! obfuscator, the provider, sinks, configuration and the request
//! interceptor.




#[cfg(test)]
pub mod provider_tests;
