//! LED 灯
//!
//! 开发板上的 4 个用户 LED 都接在 GPIOD，高电平点亮。

use crate::hardware::gpio::{Error, Pin, PinConfig, Port, PortRegisters, Speed};

/// LED 灯
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    /// LD3, PD13
    Orange,
    /// LD6, PD15
    Blue,
    /// LD4, PD12
    Green,
    /// LD5, PD14
    Red,
}

impl Led {
    pub const ALL: [Led; 4] = [Led::Orange, Led::Blue, Led::Green, Led::Red];

    pub const fn pin(self) -> Pin {
        match self {
            Led::Orange => Pin::P13,
            Led::Blue => Pin::P15,
            Led::Green => Pin::P12,
            Led::Red => Pin::P14,
        }
    }

    #[inline]
    pub const fn mask(self) -> u32 {
        self.pin().mask()
    }
}

/// LED 引脚配置: 推挽输出，中速，无上下拉
pub const LED_PIN_CONFIG: PinConfig = PinConfig::output().with_speed(Speed::Medium);

/// 板载 LED 组
pub struct Leds<R: PortRegisters> {
    port: Port<R>,
}

impl<R: PortRegisters> Leds<R> {
    /// 初始化 LED 灯
    pub fn new(port: Port<R>) -> Result<Self, Error> {
        let mut leds = Leds { port };
        leds.init()?;
        Ok(leds)
    }

    /// 把 4 个 LED 引脚配置为输出
    pub fn init(&mut self) -> Result<(), Error> {
        for led in Led::ALL {
            self.port.configure(led.pin(), &LED_PIN_CONFIG)?;
        }
        Ok(())
    }

    /// 开启 LED 灯
    pub fn turn_on(&mut self, led: Led) {
        self.port.write(led.pin(), true);
        debug!("LED {} on", led);
    }

    /// 关闭 LED 灯
    pub fn turn_off(&mut self, led: Led) {
        self.port.write(led.pin(), false);
        debug!("LED {} off", led);
    }

    /// 切换 LED 灯关闭/开启状态
    pub fn toggle(&mut self, led: Led) {
        let on = self.port.read(led.pin());
        self.port.write(led.pin(), !on);
    }

    pub fn is_on(&self, led: Led) -> bool {
        self.port.read(led.pin())
    }

    pub fn port(&self) -> &Port<R> {
        &self.port
    }

    #[cfg(test)]
    pub(crate) fn port_mut(&mut self) -> &mut Port<R> {
        &mut self.port
    }

    pub fn free(self) -> Port<R> {
        self.port
    }
}
