//! Built-in assessment plugins

pub mod device_count;

pub use device_count::DeviceCountPlugin;
