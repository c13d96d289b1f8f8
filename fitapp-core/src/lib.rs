pub mod catalog;
pub mod clock;
pub mod db;
pub mod error;
pub mod logging;
pub mod session;
pub mod store;
pub mod timer;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;
