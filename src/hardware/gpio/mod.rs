//! # GPIO 端口驱动
//!
//! 把引脚的语义属性 (模式、输出类型、上下拉、速度、复用功能)
//! 转换为 MODER / OTYPER / OSPEEDR / PUPDR / AFRL / AFRH 寄存器的位域写入。
//!
//! 寄存器的访问通过 [`PortRegisters`] 抽象，硬件实现见 [`mmio`]。

pub mod codec;
pub mod mmio;
mod port;

use core::fmt;

pub use port::Port;

/// GPIO 错误
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// 引脚编号超出 0~15
    PinOutOfRange(u8),
    /// 数值超出位域宽度
    ValueOutOfRange { value: u32, width: u8 },
    /// 位域超出 32 位寄存器
    FieldOverflow { offset: u8, width: u8 },
    InvalidMode(u8),
    InvalidOutputType(u8),
    InvalidPull(u8),
    InvalidSpeed(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PinOutOfRange(pin) => write!(f, "pin {} out of range 0..=15", pin),
            Error::ValueOutOfRange { value, width } => {
                write!(f, "value {} does not fit in {} bits", value, width)
            }
            Error::FieldOverflow { offset, width } => {
                write!(f, "{}-bit field at offset {} exceeds register", width, offset)
            }
            Error::InvalidMode(v) => write!(f, "invalid mode {}", v),
            Error::InvalidOutputType(v) => write!(f, "invalid output type {}", v),
            Error::InvalidPull(v) => write!(f, "invalid pull {}", v),
            Error::InvalidSpeed(v) => write!(f, "invalid speed {}", v),
        }
    }
}

/// 端口内的引脚编号 0~15
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    pub const P0: Pin = Pin(0);
    pub const P1: Pin = Pin(1);
    pub const P2: Pin = Pin(2);
    pub const P3: Pin = Pin(3);
    pub const P4: Pin = Pin(4);
    pub const P5: Pin = Pin(5);
    pub const P6: Pin = Pin(6);
    pub const P7: Pin = Pin(7);
    pub const P8: Pin = Pin(8);
    pub const P9: Pin = Pin(9);
    pub const P10: Pin = Pin(10);
    pub const P11: Pin = Pin(11);
    pub const P12: Pin = Pin(12);
    pub const P13: Pin = Pin(13);
    pub const P14: Pin = Pin(14);
    pub const P15: Pin = Pin(15);

    pub const fn new(index: u8) -> Result<Self, Error> {
        if index < codec::PINS_PER_PORT {
            Ok(Pin(index))
        } else {
            Err(Error::PinOutOfRange(index))
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// ODR / IDR 中对应的位
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self.0
    }
}

impl TryFrom<u8> for Pin {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Pin::new(index)
    }
}

/// 引脚模式 (MODER, 2 位)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Input = 0,
    Output = 1,
    AlternateFunction = 2,
    Analog = 3,
}

/// 输出类型 (OTYPER, 1 位)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputType {
    #[default]
    PushPull = 0,
    OpenDrain = 1,
}

/// 上拉/下拉 (PUPDR, 2 位)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    None = 0,
    PullUp = 1,
    PullDown = 2,
}

/// 输出速度 (OSPEEDR, 2 位)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    #[default]
    Low = 0,
    Medium = 1,
    Fast = 2,
    High = 3,
}

impl TryFrom<u8> for Mode {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0 => Ok(Mode::Input),
            1 => Ok(Mode::Output),
            2 => Ok(Mode::AlternateFunction),
            3 => Ok(Mode::Analog),
            _ => Err(Error::InvalidMode(bits)),
        }
    }
}

impl TryFrom<u8> for OutputType {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0 => Ok(OutputType::PushPull),
            1 => Ok(OutputType::OpenDrain),
            _ => Err(Error::InvalidOutputType(bits)),
        }
    }
}

impl TryFrom<u8> for Pull {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0 => Ok(Pull::None),
            1 => Ok(Pull::PullUp),
            2 => Ok(Pull::PullDown),
            _ => Err(Error::InvalidPull(bits)),
        }
    }
}

impl TryFrom<u8> for Speed {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0 => Ok(Speed::Low),
            1 => Ok(Speed::Medium),
            2 => Ok(Speed::Fast),
            3 => Ok(Speed::High),
            _ => Err(Error::InvalidSpeed(bits)),
        }
    }
}

/// 引脚配置
///
/// 在栈上构造，交给 [`Port::configure`] 一次性写入。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub mode: Mode,
    /// 仅在输出/复用模式下有意义
    pub output_type: OutputType,
    pub pull: Pull,
    pub speed: Speed,
    /// 复用功能编号 0~15，仅在复用模式下写入
    pub alternate_function: u8,
}

impl PinConfig {
    /// 输入模式
    pub const fn input(pull: Pull) -> Self {
        PinConfig {
            mode: Mode::Input,
            output_type: OutputType::PushPull,
            pull,
            speed: Speed::Low,
            alternate_function: 0,
        }
    }

    /// 推挽输出，低速，无上下拉
    pub const fn output() -> Self {
        PinConfig {
            mode: Mode::Output,
            ..PinConfig::input(Pull::None)
        }
    }

    /// 复用功能 `af`
    pub const fn alternate(af: u8) -> Self {
        PinConfig {
            mode: Mode::AlternateFunction,
            alternate_function: af,
            ..PinConfig::input(Pull::None)
        }
    }

    pub const fn analog() -> Self {
        PinConfig {
            mode: Mode::Analog,
            ..PinConfig::input(Pull::None)
        }
    }

    pub const fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    pub const fn with_pull(mut self, pull: Pull) -> Self {
        self.pull = pull;
        self
    }

    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }
}

/// 原始引脚配置，各字段与寄存器位模式一一对应
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawPinConfig {
    /// 0~15
    pub pin: u8,
    /// 0~3
    pub mode: u8,
    /// 0~1
    pub output_type: u8,
    /// 0~2
    pub pull: u8,
    /// 0~3
    pub speed: u8,
    /// 0~15
    pub alternate_function: u8,
}

impl TryFrom<RawPinConfig> for (Pin, PinConfig) {
    type Error = Error;

    fn try_from(raw: RawPinConfig) -> Result<Self, Self::Error> {
        if raw.alternate_function > 15 {
            return Err(Error::ValueOutOfRange {
                value: raw.alternate_function as u32,
                width: codec::FieldWidth::Four.bits(),
            });
        }

        let config = PinConfig {
            mode: Mode::try_from(raw.mode)?,
            output_type: OutputType::try_from(raw.output_type)?,
            pull: Pull::try_from(raw.pull)?,
            speed: Speed::try_from(raw.speed)?,
            alternate_function: raw.alternate_function,
        };
        Ok((Pin::new(raw.pin)?, config))
    }
}

/// GPIO 端口寄存器
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// MODER
    Mode,
    /// OTYPER
    OutputType,
    /// OSPEEDR
    Speed,
    /// PUPDR
    Pull,
    /// IDR, 只读
    InputData,
    /// ODR
    OutputData,
    /// AFRL
    AlternateLow,
    /// AFRH
    AlternateHigh,
}

impl Register {
    pub const fn alternate(word: codec::AfWord) -> Self {
        match word {
            codec::AfWord::Low => Register::AlternateLow,
            codec::AfWord::High => Register::AlternateHigh,
        }
    }
}

/// 端口寄存器的读写接口
///
/// 实现者必须独占一组寄存器，[`Port`] 通过它完成所有读-改-写。
pub trait PortRegisters {
    fn read(&self, register: Register) -> u32;

    /// 写 [`Register::InputData`] 没有效果
    fn write(&mut self, register: Register, value: u32);
}

/// GPIO 端口
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortId {
    A,
    B,
    C,
    D,
    E,
    H,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_bounds() {
        assert_eq!(Pin::new(15), Ok(Pin::P15));
        assert_eq!(Pin::new(16), Err(Error::PinOutOfRange(16)));
        assert_eq!(Pin::try_from(3u8).map(Pin::mask), Ok(0b1000));
    }

    #[test]
    fn numeric_domains_match_register_bits() {
        assert_eq!(Mode::AlternateFunction as u8, 2);
        assert_eq!(OutputType::OpenDrain as u8, 1);
        assert_eq!(Pull::PullDown as u8, 2);
        assert_eq!(Speed::High as u8, 3);

        assert_eq!(Mode::try_from(4), Err(Error::InvalidMode(4)));
        assert_eq!(OutputType::try_from(2), Err(Error::InvalidOutputType(2)));
        assert_eq!(Pull::try_from(3), Err(Error::InvalidPull(3)));
        assert_eq!(Speed::try_from(4), Err(Error::InvalidSpeed(4)));
    }

    #[test]
    fn raw_config_is_validated() {
        let raw = RawPinConfig {
            pin: 9,
            mode: 2,
            output_type: 1,
            pull: 1,
            speed: 3,
            alternate_function: 7,
        };
        let (pin, config) = <(Pin, PinConfig)>::try_from(raw).unwrap();
        assert_eq!(pin, Pin::P9);
        assert_eq!(
            config,
            PinConfig::alternate(7)
                .with_output_type(OutputType::OpenDrain)
                .with_pull(Pull::PullUp)
                .with_speed(Speed::High)
        );

        let bad_af = RawPinConfig {
            alternate_function: 16,
            ..raw
        };
        assert_eq!(
            <(Pin, PinConfig)>::try_from(bad_af),
            Err(Error::ValueOutOfRange { value: 16, width: 4 })
        );

        let bad_pin = RawPinConfig { pin: 16, ..raw };
        assert_eq!(
            <(Pin, PinConfig)>::try_from(bad_pin),
            Err(Error::PinOutOfRange(16))
        );
    }
}
