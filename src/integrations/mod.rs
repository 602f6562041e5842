//! 通道适配器：终端、Web Chat（需 webchat feature）

pub mod console;

#[cfg(feature = "webchat")]
pub mod connector;
#[cfg(feature = "webchat")]
pub mod webchat;
