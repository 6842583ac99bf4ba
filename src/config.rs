//! 全局配置

use crate::hardware::gpio::{Pin, PortId};

/// 系统时钟 (复位后的 HSI, 16MHz)，APB1 不分频
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// USART2 波特率
pub const USART2_BAUDRATE: u32 = 115_200;
/// USART2 发送引脚 PA2
pub const USART2_TX_PIN: Pin = Pin::P2;
/// USART2 接收引脚 PA3
pub const USART2_RX_PIN: Pin = Pin::P3;
/// PA2/PA3 复用为 USART2: AF7
pub const USART2_AF: u8 = 7;

/// 命令行缓冲区长度 (含结尾的 '\0')
pub const LINE_CAPACITY: usize = 100;

/// LED 所在端口
pub const LED_PORT: PortId = PortId::D;

/// 两条命令之间的空转周期，避免串口被刷屏
pub const DISPATCH_DELAY_CYCLES: u32 = 50_000;
