//! 串口命令
//!
//! 每行一条命令，以 '\n' 或 '\r' 结尾，区分大小写:
//! - `LED_ON orange` / `LED_OFF orange`
//! - `LED_ON blue` / `LED_OFF blue`
//!
//! 成功回复 `OK\n`，其余输入回复 `UNKNOWN COMMAND\n`。

use crate::config::LINE_CAPACITY;
use crate::hardware::gpio::PortRegisters;
use crate::hardware::led::{Led, Leds};
use crate::hardware::usart::{Error, Usart, UsartRegisters};

pub const RESPONSE_OK: &str = "OK\n";
pub const RESPONSE_UNKNOWN: &str = "UNKNOWN COMMAND\n";

/// LED 控制命令
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    LedOnOrange,
    LedOffOrange,
    LedOnBlue,
    LedOffBlue,
}

impl Command {
    /// 解析一行命令，不接受多余的空白
    pub fn parse(line: &str) -> Option<Command> {
        match line {
            "LED_ON orange" => Some(Command::LedOnOrange),
            "LED_OFF orange" => Some(Command::LedOffOrange),
            "LED_ON blue" => Some(Command::LedOnBlue),
            "LED_OFF blue" => Some(Command::LedOffBlue),
            _ => None,
        }
    }

    pub fn led(self) -> Led {
        match self {
            Command::LedOnOrange | Command::LedOffOrange => Led::Orange,
            Command::LedOnBlue | Command::LedOffBlue => Led::Blue,
        }
    }

    pub fn apply<R: PortRegisters>(self, leds: &mut Leds<R>) {
        match self {
            Command::LedOnOrange | Command::LedOnBlue => leds.turn_on(self.led()),
            Command::LedOffOrange | Command::LedOffBlue => leds.turn_off(self.led()),
        }
    }
}

/// 一次分发的结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Executed(Command),
    Unknown,
}

impl Outcome {
    pub fn response(self) -> &'static str {
        match self {
            Outcome::Executed(_) => RESPONSE_OK,
            Outcome::Unknown => RESPONSE_UNKNOWN,
        }
    }
}

/// 命令分发器
///
/// 独占串口和 LED，每次 [`Dispatcher::poll`] 处理一行。
pub struct Dispatcher<U: UsartRegisters, R: PortRegisters> {
    usart: Usart<U>,
    leds: Leds<R>,
}

impl<U: UsartRegisters, R: PortRegisters> Dispatcher<U, R> {
    pub fn new(usart: Usart<U>, leds: Leds<R>) -> Self {
        Dispatcher { usart, leds }
    }

    /// 读一行、执行并回复
    ///
    /// 无法识别的输入 (包括非 UTF-8 和带接收错误的行) 只回复
    /// `UNKNOWN COMMAND`，每行输入恰好一条回复。只有超时才返回 `Err`。
    pub fn poll(&mut self) -> Result<Outcome, Error> {
        let outcome = match self.usart.receive_string::<LINE_CAPACITY>() {
            Ok(line) => match Command::parse(&line) {
                Some(command) => {
                    command.apply(&mut self.leds);
                    info!("command: {}", command);
                    Outcome::Executed(command)
                }
                None => {
                    warn!("unknown command: {=str}", line.as_str());
                    Outcome::Unknown
                }
            },
            // 接收错误已在串口层记录，整行丢弃
            Err(Error::Encoding | Error::Overrun | Error::Framing | Error::Noise | Error::Parity) => {
                warn!("unknown command: line dropped");
                Outcome::Unknown
            }
            Err(e) => return Err(e),
        };

        self.usart.send_string(outcome.response())?;
        Ok(outcome)
    }

    pub fn usart(&self) -> &Usart<U> {
        &self.usart
    }

    pub fn leds(&self) -> &Leds<R> {
        &self.leds
    }

    #[cfg(test)]
    pub(crate) fn leds_mut(&mut self) -> &mut Leds<R> {
        &mut self.leds
    }

    pub fn free(self) -> (Usart<U>, Leds<R>) {
        (self.usart, self.leds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::gpio::{Port, PortId, Register};
    use crate::hardware::usart::{Deadline, UsartConfig, SR_NF};
    use crate::mock::{MockPort, MockUsart};

    fn dispatcher(input: &[u8]) -> Dispatcher<MockUsart, MockPort> {
        let mut gpioa = Port::new(PortId::A, MockPort::new());
        let config = UsartConfig {
            deadline: Deadline::Polls(16),
            ..UsartConfig::default()
        };
        let usart = Usart::new(MockUsart::with_input(input), &mut gpioa, &config).unwrap();
        let leds = Leds::new(Port::new(PortId::D, MockPort::new())).unwrap();

        let mut dispatcher = Dispatcher::new(usart, leds);
        dispatcher.leds_mut().port_mut().registers_mut().clear_log();
        dispatcher
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!(Command::parse("LED_ON orange"), Some(Command::LedOnOrange));
        assert_eq!(Command::parse("LED_OFF blue"), Some(Command::LedOffBlue));
        assert_eq!(Command::parse("led_on orange"), None);
        assert_eq!(Command::parse("LED_ON orange "), None);
        assert_eq!(Command::parse("LED_ON  blue"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn led_on_orange_writes_pin_13_once() {
        let mut dispatcher = dispatcher(b"LED_ON orange\n");
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOnOrange)));

        let regs = dispatcher.leds().port().registers();
        assert_eq!(regs.written(), [Register::OutputData]);
        assert_eq!(regs.get(Register::OutputData), 1 << 13);
        assert_eq!(dispatcher.usart().registers().tx, b"OK\n");
    }

    #[test]
    fn unknown_led_touches_nothing() {
        let mut dispatcher = dispatcher(b"LED_ON green\n");
        assert_eq!(dispatcher.poll(), Ok(Outcome::Unknown));

        assert!(dispatcher.leds().port().registers().written().is_empty());
        assert_eq!(dispatcher.usart().registers().tx, b"UNKNOWN COMMAND\n");
    }

    #[test]
    fn session_of_lines() {
        let mut dispatcher = dispatcher(
            b"LED_ON blue\rLED_ON orange\nLED_OFF blue\n\xC3\x28\nLED_OFF orange\nLED_ON orange\n",
        );
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOnBlue)));
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOnOrange)));
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOffBlue)));
        assert_eq!(dispatcher.poll(), Ok(Outcome::Unknown));
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOffOrange)));
        assert!(!dispatcher.leds().is_on(Led::Orange));
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOnOrange)));

        let (usart, leds) = dispatcher.free();
        assert!(leds.is_on(Led::Orange));
        assert!(!leds.is_on(Led::Blue));
        assert_eq!(
            usart.registers().tx,
            b"OK\nOK\nOK\nUNKNOWN COMMAND\nOK\nOK\n"
        );
    }

    #[test]
    fn noisy_line_gets_one_reply() {
        let dispatcher = dispatcher(b"LED_ON orange\nLED_ON blue\n");
        let (usart, leds) = dispatcher.free();
        let mut regs = usart.free();
        regs.error_flags = SR_NF;
        let mut gpioa = Port::new(PortId::A, MockPort::new());
        let usart = Usart::new(regs, &mut gpioa, &UsartConfig::default()).unwrap();
        let mut dispatcher = Dispatcher::new(usart, leds);

        assert_eq!(dispatcher.poll(), Ok(Outcome::Unknown));
        assert!(dispatcher.leds().port().registers().written().is_empty());
        assert_eq!(dispatcher.usart().registers().tx, b"UNKNOWN COMMAND\n");

        // 下一行不受影响
        assert_eq!(dispatcher.poll(), Ok(Outcome::Executed(Command::LedOnBlue)));
        assert!(!dispatcher.leds().is_on(Led::Orange));
        assert_eq!(
            dispatcher.usart().registers().tx,
            b"UNKNOWN COMMAND\nOK\n"
        );
    }

    #[test]
    fn empty_line_is_unknown() {
        let mut dispatcher = dispatcher(b"\n");
        assert_eq!(dispatcher.poll(), Ok(Outcome::Unknown));
    }

    #[test]
    fn silent_line_times_out() {
        let mut dispatcher = dispatcher(b"LED_ON");
        assert_eq!(dispatcher.poll(), Err(Error::Timeout));
        assert!(dispatcher.usart().registers().tx.is_empty());
    }
}
