//! USART 寄存器的内存映射实现

use stm32f4xx_hal::pac;

use super::UsartRegisters;

/// CR1: 接收使能
const CR1_RE: u32 = 1 << 2;
/// CR1: 发送使能
const CR1_TE: u32 = 1 << 3;
/// CR1: USART 使能
const CR1_UE: u32 = 1 << 13;

macro_rules! mmio_usart {
    ($($USARTX:ident,)+) => {
        $(
            impl UsartRegisters for pac::$USARTX {
                #[inline]
                fn status(&self) -> u32 {
                    self.sr.read().bits()
                }

                #[inline]
                fn read_data(&mut self) -> u8 {
                    self.dr.read().bits() as u8
                }

                #[inline]
                fn write_data(&mut self, byte: u8) {
                    self.dr.write(|w| unsafe { w.bits(byte as u32) });
                }

                fn set_baud_divisor(&mut self, divisor: u32) {
                    self.brr.write(|w| unsafe { w.bits(divisor) });
                }

                fn enable(&mut self) {
                    // 8N1, 16 倍过采样
                    self.cr1.write(|w| unsafe { w.bits(CR1_UE | CR1_TE | CR1_RE) });
                }
            }
        )+
    };
}

mmio_usart! {
    USART1,
    USART2,
    USART6,
}
