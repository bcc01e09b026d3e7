pub mod cache;
pub mod config;
pub mod contract;
pub mod debounce;
pub mod highlight;
pub mod logging;
pub mod model;
pub mod present;
pub mod remote;
pub mod runtime;
pub mod search;
pub mod session;
pub mod store;
pub mod suggestion;
pub mod transport;
