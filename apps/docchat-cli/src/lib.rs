//! Service wiring, logging setup and the HTTP API shared by the docchat binaries.
pub mod http;
pub mod services;
pub mod telemetry;
