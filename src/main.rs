#![no_std]
#![no_main]

use stm32f411_gpio_uart::{
    command::{Dispatcher, Outcome},
    config::{DISPATCH_DELAY_CYCLES, LED_PORT},
    hardware::{
        gpio::Port,
        led::Leds,
        usart::{Usart, UsartConfig},
    },
};

use cortex_m::asm::delay;
use defmt::{println, warn};
use stm32f4xx_hal::pac;

// 定义应用程序资源和任务
#[rtic::app(device = stm32f4xx_hal::pac, peripherals = true)]
mod app {
    use super::*;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        dispatcher: Dispatcher<pac::USART2, pac::GPIOD>,
    }

    // 初始化函数
    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        println!("init start ...");

        // 打开 GPIOA/GPIOD 和 USART2 时钟，系统时钟保持复位后的 HSI
        dp.RCC
            .ahb1enr
            .modify(|_, w| w.gpioaen().enabled().gpioden().enabled());
        dp.RCC.apb1enr.modify(|_, w| w.usart2en().enabled());

        let mut gpioa = Port::from(dp.GPIOA);
        let gpiod = Port::new(LED_PORT, dp.GPIOD);

        // 初始化 LED 灯
        let leds = Leds::new(gpiod).unwrap();
        // 初始化串口
        let usart = Usart::new(dp.USART2, &mut gpioa, &UsartConfig::default()).unwrap();

        let dispatcher = Dispatcher::new(usart, leds);

        println!("init end ...");
        (Shared {}, Local { dispatcher })
    }

    /// 命令处理
    #[idle(local = [dispatcher])]
    fn idle(ctx: idle::Context) -> ! {
        let dispatcher = ctx.local.dispatcher;
        loop {
            match dispatcher.poll() {
                Ok(Outcome::Executed(command)) => println!("executed {}", command),
                Ok(Outcome::Unknown) => {}
                Err(e) => warn!("USART error: {}", e),
            }
            delay(DISPATCH_DELAY_CYCLES);
        }
    }
}
