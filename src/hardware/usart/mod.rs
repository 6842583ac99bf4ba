//! USART 通用串口
//!
//! 轮询状态寄存器收发，不使用中断，除了正在收发的一个字节外不做缓冲。
//! 阻塞操作的等待时间由 [`Deadline`] 决定，默认一直等待。
mod mmio;
mod utils;

use core::fmt;

use embedded_hal::serial;
use heapless::{String, Vec};

use crate::config::{SYSTEM_CLOCK_HZ, USART2_AF, USART2_BAUDRATE, USART2_RX_PIN, USART2_TX_PIN};
use crate::hardware::gpio::{self, Pin, PinConfig, Port, PortRegisters};

pub use utils::{wait, Deadline};

/// SR: 校验错误
pub const SR_PE: u32 = 1 << 0;
/// SR: 帧错误
pub const SR_FE: u32 = 1 << 1;
/// SR: 噪声
pub const SR_NF: u32 = 1 << 2;
/// SR: 溢出
pub const SR_ORE: u32 = 1 << 3;
/// SR: 接收数据寄存器非空
pub const SR_RXNE: u32 = 1 << 5;
/// SR: 发送完成
pub const SR_TC: u32 = 1 << 6;
/// SR: 发送数据寄存器空
pub const SR_TXE: u32 = 1 << 7;

const SR_ERRORS: u32 = SR_PE | SR_FE | SR_NF | SR_ORE;

/// 串口错误
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// 超过等待期限
    Timeout,
    Overrun,
    Framing,
    Noise,
    Parity,
    /// 收到的行不是 UTF-8
    Encoding,
    /// 波特率为 0 或高于外设时钟
    InvalidBaudrate(u32),
    /// 引脚配置失败
    Gpio(gpio::Error),
}

impl From<gpio::Error> for Error {
    fn from(e: gpio::Error) -> Self {
        Error::Gpio(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout => f.write_str("timed out waiting for USART"),
            Error::Overrun => f.write_str("receive overrun"),
            Error::Framing => f.write_str("framing error"),
            Error::Noise => f.write_str("noise detected"),
            Error::Parity => f.write_str("parity error"),
            Error::Encoding => f.write_str("line is not valid UTF-8"),
            Error::InvalidBaudrate(baud) => write!(f, "unusable baud rate {}", baud),
            Error::Gpio(e) => write!(f, "pin setup failed: {}", e),
        }
    }
}

/// USART 寄存器的读写接口
pub trait UsartRegisters {
    /// SR
    fn status(&self) -> u32;
    /// 读 DR，同时清除 RXNE 和错误标志
    fn read_data(&mut self) -> u8;
    /// 写 DR
    fn write_data(&mut self, byte: u8);
    /// BRR
    fn set_baud_divisor(&mut self, divisor: u32);
    /// 打开发送器、接收器和 USART
    fn enable(&mut self);
}

/// 串口配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartConfig {
    pub baudrate: u32,
    /// 外设总线时钟
    pub pclk_hz: u32,
    pub deadline: Deadline,
    pub tx_pin: Pin,
    pub rx_pin: Pin,
    pub alternate_function: u8,
}

impl Default for UsartConfig {
    fn default() -> Self {
        UsartConfig {
            baudrate: USART2_BAUDRATE,
            pclk_hz: SYSTEM_CLOCK_HZ,
            deadline: Deadline::Forever,
            tx_pin: USART2_TX_PIN,
            rx_pin: USART2_RX_PIN,
            alternate_function: USART2_AF,
        }
    }
}

/// USART 串口
pub struct Usart<U: UsartRegisters> {
    regs: U,
    deadline: Deadline,
}

impl<U: UsartRegisters> Usart<U> {
    /// 初始化串口
    ///
    /// 先把收发引脚配置为复用功能，再设置波特率并打开串口。
    /// 端口和串口的时钟需要事先打开。
    pub fn new<P: PortRegisters>(
        mut regs: U,
        port: &mut Port<P>,
        config: &UsartConfig,
    ) -> Result<Self, Error> {
        let divisor = config
            .pclk_hz
            .checked_div(config.baudrate)
            .filter(|&divisor| divisor != 0)
            .ok_or(Error::InvalidBaudrate(config.baudrate))?;

        let pin_config = PinConfig::alternate(config.alternate_function);
        port.configure(config.tx_pin, &pin_config)?;
        port.configure(config.rx_pin, &pin_config)?;

        regs.set_baud_divisor(divisor);
        regs.enable();

        debug!("USART up: {} baud", config.baudrate);
        Ok(Usart {
            regs,
            deadline: config.deadline,
        })
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub fn set_deadline(&mut self, deadline: Deadline) {
        self.deadline = deadline;
    }

    pub fn registers(&self) -> &U {
        &self.regs
    }

    pub fn free(self) -> U {
        self.regs
    }

    /// 发送字节
    pub fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        let deadline = self.deadline;
        wait(deadline, || <Self as serial::Write<u8>>::write(self, byte))
    }

    /// 发送字节数组
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// 发送字符串
    /// 结束发送标识符: '\0'
    pub fn send_string(&mut self, s: &str) -> Result<(), Error> {
        for &byte in s.as_bytes() {
            if byte == b'\0' {
                break;
            }
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// 等待最后一个字节发送完成
    pub fn flush(&mut self) -> Result<(), Error> {
        let deadline = self.deadline;
        wait(deadline, || <Self as serial::Write<u8>>::flush(self))
    }

    /// 接收字节
    pub fn receive_byte(&mut self) -> Result<u8, Error> {
        let deadline = self.deadline;
        wait(deadline, || <Self as serial::Read<u8>>::read(self))
    }

    /// 接收一行
    ///
    /// 收到 '\n' 或 '\r'，或者缓冲区只剩结尾 '\0' 的位置时结束。
    /// 行尾符不写入缓冲区，总是以 '\0' 结尾，返回行长度。
    ///
    /// 某个字节出现溢出/帧/噪声/校验错误时，丢弃本行剩余的字节直到行尾，
    /// 再返回该错误，下一次调用从新的一行开始。
    pub fn receive_line(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some(capacity) = buf.len().checked_sub(1) else {
            return Ok(0);
        };

        let mut len = 0;
        while len < capacity {
            match self.receive_byte() {
                Ok(b'\n' | b'\r') => break,
                Ok(byte) => {
                    buf[len] = byte;
                    len += 1;
                }
                Err(Error::Timeout) => return Err(Error::Timeout),
                Err(e) => {
                    buf[len] = b'\0';
                    self.discard_line()?;
                    return Err(e);
                }
            }
        }
        buf[len] = b'\0';

        Ok(len)
    }

    /// 丢弃字节直到行尾 (含行尾符)
    fn discard_line(&mut self) -> Result<(), Error> {
        loop {
            match self.receive_byte() {
                Ok(b'\n' | b'\r') => return Ok(()),
                Ok(_) => {}
                Err(Error::Timeout) => return Err(Error::Timeout),
                // 同一行内的后续错误一并丢弃
                Err(_) => {}
            }
        }
    }

    /// 接收字符串
    /// 最大长度: N - 1
    pub fn receive_string<const N: usize>(&mut self) -> Result<String<N>, Error> {
        let mut buf = [0u8; N];
        let len = self.receive_line(&mut buf)?;
        let bytes = Vec::<u8, N>::from_slice(&buf[..len]).map_err(|_| Error::Encoding)?;
        String::from_utf8(bytes).map_err(|_| Error::Encoding)
    }
}

impl<U: UsartRegisters> serial::Read<u8> for Usart<U> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        let sr = self.regs.status();
        if sr & SR_ERRORS != 0 {
            // 先读 SR 再读 DR 清除错误标志
            let _ = self.regs.read_data();
            let error = if sr & SR_ORE != 0 {
                Error::Overrun
            } else if sr & SR_FE != 0 {
                Error::Framing
            } else if sr & SR_NF != 0 {
                Error::Noise
            } else {
                Error::Parity
            };
            warn!("USART receive error: {}", error);
            return Err(nb::Error::Other(error));
        }

        if sr & SR_RXNE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.regs.read_data())
    }
}

impl<U: UsartRegisters> serial::Write<u8> for Usart<U> {
    type Error = Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        if self.regs.status() & SR_TXE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.write_data(byte);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        if self.regs.status() & SR_TC == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }
}

// 支持 `write!` / `writeln!`
impl<U: UsartRegisters> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.send_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
