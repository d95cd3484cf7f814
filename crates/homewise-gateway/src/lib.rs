//! HTTP clients for the services the recommendation engine talks to:
//! the weather service, the device gateway, and the hardware display.
//!
//! Each client implements the matching collaborator trait from
//! `homewise-core`, so the engine never depends on `reqwest` directly.

pub mod devices;
pub mod error;
pub mod hardware;
pub mod weather;

pub use devices::DeviceGatewayClient;
pub use error::{GatewayError, Result};
pub use hardware::HardwareClient;
pub use weather::WeatherClient;
