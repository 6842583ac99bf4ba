//! # 寄存器位域编解码
//!
//! GPIO 端口的配置寄存器把 16 个引脚打包在 32 位字里，
//! 每个引脚占 1 位 (OTYPER)、2 位 (MODER/OSPEEDR/PUPDR) 或 4 位 (AFRL/AFRH)。
//! 复用功能表共 16 x 4 = 64 位，拆分在两个字里。
//!
//! 本模块只做纯计算，不访问硬件。

use super::Error;

/// 每个端口的引脚数
pub const PINS_PER_PORT: u8 = 16;

/// 寄存器位数
const REGISTER_BITS: u8 = 32;

/// 每个引脚在寄存器中占用的位数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl FieldWidth {
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// 复用功能寄存器字
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AfWord {
    /// AFRL, 引脚 0~7
    Low = 0,
    /// AFRH, 引脚 8~15
    High = 1,
}

impl AfWord {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 已移位的位域掩码
#[inline]
pub const fn field_mask(offset: u8, width: FieldWidth) -> u32 {
    (((1u64 << width.bits()) - 1) << offset) as u32
}

fn check_pin(pin: u8) -> Result<(), Error> {
    if pin < PINS_PER_PORT {
        Ok(())
    } else {
        Err(Error::PinOutOfRange(pin))
    }
}

fn check_field(offset: u8, width: FieldWidth) -> Result<(), Error> {
    if offset as u16 + width.bits() as u16 <= REGISTER_BITS as u16 {
        Ok(())
    } else {
        Err(Error::FieldOverflow {
            offset,
            width: width.bits(),
        })
    }
}

/// 单寄存器位域的偏移: `pin * width`
///
/// 4 位宽的位域只有引脚 0~7 放得下，复用功能请使用 [`pack_split`]。
pub fn pack(pin: u8, width: FieldWidth) -> Result<u8, Error> {
    check_pin(pin)?;
    let offset = pin * width.bits();
    check_field(offset, width)?;
    Ok(offset)
}

/// 复用功能位域: 引脚 0~7 在 AFRL 的 `pin * 4`，
/// 引脚 8~15 在 AFRH 的 `(pin - 8) * 4`
pub fn pack_split(pin: u8) -> Result<(AfWord, u8), Error> {
    check_pin(pin)?;
    let word = if pin < 8 { AfWord::Low } else { AfWord::High };
    Ok((word, (pin % 8) * FieldWidth::Four.bits()))
}

/// 读-改-写: 先清除目标位域，再写入新值
///
/// 位域外的位保持不变。`value` 超出位宽时返回 [`Error::ValueOutOfRange`]。
pub fn apply(register: u32, offset: u8, width: FieldWidth, value: u32) -> Result<u32, Error> {
    check_field(offset, width)?;
    if value >> width.bits() != 0 {
        return Err(Error::ValueOutOfRange {
            value,
            width: width.bits(),
        });
    }

    let mask = field_mask(offset, width);
    Ok((register & !mask) | (value << offset))
}

/// 读取位域的值
pub fn extract(register: u32, offset: u8, width: FieldWidth) -> Result<u32, Error> {
    check_field(offset, width)?;
    Ok((register & field_mask(offset, width)) >> offset)
}
