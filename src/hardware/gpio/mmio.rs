//! GPIO 寄存器的内存映射实现
//!
//! PAC 外设单例按值移入 [`Port`]，同一个端口不会有两个所有者。
//! 调用前需要在 RCC 中打开对应端口的时钟。

use stm32f4xx_hal::pac;

use super::{Port, PortId, PortRegisters, Register};

macro_rules! mmio_port {
    ($($GPIOX:ident => $id:ident,)+) => {
        $(
            impl PortRegisters for pac::$GPIOX {
                #[inline]
                fn read(&self, register: Register) -> u32 {
                    match register {
                        Register::Mode => self.moder.read().bits(),
                        Register::OutputType => self.otyper.read().bits(),
                        Register::Speed => self.ospeedr.read().bits(),
                        Register::Pull => self.pupdr.read().bits(),
                        Register::InputData => self.idr.read().bits(),
                        Register::OutputData => self.odr.read().bits(),
                        Register::AlternateLow => self.afrl.read().bits(),
                        Register::AlternateHigh => self.afrh.read().bits(),
                    }
                }

                #[inline]
                fn write(&mut self, register: Register, value: u32) {
                    // 所有位模式都由 codec 校验过
                    unsafe {
                        match register {
                            Register::Mode => self.moder.write(|w| w.bits(value)),
                            Register::OutputType => self.otyper.write(|w| w.bits(value)),
                            Register::Speed => self.ospeedr.write(|w| w.bits(value)),
                            Register::Pull => self.pupdr.write(|w| w.bits(value)),
                            // 只读
                            Register::InputData => {}
                            Register::OutputData => self.odr.write(|w| w.bits(value)),
                            Register::AlternateLow => self.afrl.write(|w| w.bits(value)),
                            Register::AlternateHigh => self.afrh.write(|w| w.bits(value)),
                        }
                    }
                }
            }

            impl From<pac::$GPIOX> for Port<pac::$GPIOX> {
                fn from(regs: pac::$GPIOX) -> Self {
                    Port::new(PortId::$id, regs)
                }
            }
        )+
    };
}

mmio_port! {
    GPIOA => A,
    GPIOB => B,
    GPIOC => C,
    GPIOD => D,
    GPIOE => E,
    GPIOH => H,
}
