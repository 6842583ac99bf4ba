//! GPIO 端口

use super::codec::{self, FieldWidth};
use super::{
    Error, Mode, OutputType, Pin, PinConfig, PortId, PortRegisters, Pull, Register, Speed,
};

/// GPIO 端口
///
/// 独占一组端口寄存器，所有写入都是先清除后设置的读-改-写。
/// 对同一端口的访问需要 `&mut`，不同上下文不能同时持有。
pub struct Port<R: PortRegisters> {
    id: PortId,
    regs: R,
}

impl<R: PortRegisters> Port<R> {
    pub fn new(id: PortId, regs: R) -> Self {
        Port { id, regs }
    }

    #[inline]
    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    #[cfg(test)]
    pub(crate) fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// 释放寄存器
    pub fn free(self) -> R {
        self.regs
    }

    /// 配置引脚
    ///
    /// 写入顺序固定: MODER、OSPEEDR、OTYPER、PUPDR，复用模式下最后写 AFRL/AFRH。
    /// 重复配置同一引脚时以最后一次为准。
    pub fn configure(&mut self, pin: Pin, config: &PinConfig) -> Result<(), Error> {
        // 复用功能编号在任何写入之前校验
        if config.mode == Mode::AlternateFunction && config.alternate_function > 15 {
            return Err(Error::ValueOutOfRange {
                value: config.alternate_function as u32,
                width: FieldWidth::Four.bits(),
            });
        }

        self.update_field(Register::Mode, pin, FieldWidth::Two, config.mode as u32)?;
        self.update_field(Register::Speed, pin, FieldWidth::Two, config.speed as u32)?;
        self.update_field(
            Register::OutputType,
            pin,
            FieldWidth::One,
            config.output_type as u32,
        )?;
        self.update_field(Register::Pull, pin, FieldWidth::Two, config.pull as u32)?;

        if config.mode == Mode::AlternateFunction {
            self.set_alternate_function(pin, config.alternate_function)?;
        }

        trace!("GPIO{} {} configured: {}", self.id, pin.index(), config);
        Ok(())
    }

    /// 读取引脚电平 (IDR)
    ///
    /// 不限制引脚模式，输出引脚读到的是实际驱动电平。
    pub fn read(&self, pin: Pin) -> bool {
        (self.regs.read(Register::InputData) >> pin.index()) & 1 != 0
    }

    /// 设置引脚输出电平 (ODR)
    pub fn write(&mut self, pin: Pin, level: bool) {
        let odr = self.regs.read(Register::OutputData);
        let odr = if level {
            odr | pin.mask()
        } else {
            odr & !pin.mask()
        };
        self.regs.write(Register::OutputData, odr);
    }

    /// 翻转 ODR 中引脚的输出电平
    pub fn toggle(&mut self, pin: Pin) {
        let high = self.regs.read(Register::OutputData) & pin.mask() != 0;
        self.write(pin, !high);
    }

    /// 设置复用功能编号 0~15
    pub fn set_alternate_function(&mut self, pin: Pin, af: u8) -> Result<(), Error> {
        let (word, offset) = codec::pack_split(pin.index())?;
        self.update(Register::alternate(word), offset, FieldWidth::Four, af as u32)
    }

    /// 从寄存器中读回引脚当前的配置
    pub fn config(&self, pin: Pin) -> Result<PinConfig, Error> {
        let field = |register: Register, width: FieldWidth| -> Result<u8, Error> {
            let offset = codec::pack(pin.index(), width)?;
            Ok(codec::extract(self.regs.read(register), offset, width)? as u8)
        };

        let (word, offset) = codec::pack_split(pin.index())?;
        let af = codec::extract(
            self.regs.read(Register::alternate(word)),
            offset,
            FieldWidth::Four,
        )?;

        Ok(PinConfig {
            mode: Mode::try_from(field(Register::Mode, FieldWidth::Two)?)?,
            output_type: OutputType::try_from(field(Register::OutputType, FieldWidth::One)?)?,
            pull: Pull::try_from(field(Register::Pull, FieldWidth::Two)?)?,
            speed: Speed::try_from(field(Register::Speed, FieldWidth::Two)?)?,
            alternate_function: af as u8,
        })
    }

    fn update_field(
        &mut self,
        register: Register,
        pin: Pin,
        width: FieldWidth,
        value: u32,
    ) -> Result<(), Error> {
        let offset = codec::pack(pin.index(), width)?;
        self.update(register, offset, width, value)
    }

    fn update(
        &mut self,
        register: Register,
        offset: u8,
        width: FieldWidth,
        value: u32,
    ) -> Result<(), Error> {
        let current = self.regs.read(register);
        let updated = codec::apply(current, offset, width, value)?;
        self.regs.write(register, updated);
        Ok(())
    }
}
