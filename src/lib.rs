#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod command;
pub mod config;
pub mod hardware;

#[cfg(test)]
mod mock;

// global logger
#[cfg(feature = "firmware")]
use defmt_rtt as _;
#[cfg(feature = "firmware")]
use panic_probe as _;

// 引脚分配 (STM32F411E-DISCO)
// 备注*的引脚为板载连接，不要改作他用
#[allow(unused)]
enum _Pin {
    // USART2 串口, 经 ST-LINK 虚拟串口引出
    PA2, // *
    PA3, // *

    // LED 灯
    PD12, // * 绿
    PD13, // * 橙
    PD14, // * 红
    PD15, // * 蓝

    // 调试接口, 不可使用
    PA13,
    PA14,
}
