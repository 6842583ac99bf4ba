//! 硬件外设
pub mod gpio;
pub mod led;
pub mod usart;
