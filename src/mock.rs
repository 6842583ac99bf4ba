//! 主机单元测试用的寄存器模拟

use core::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::hardware::gpio::{Pin, PortRegisters, Register};
use crate::hardware::usart::{UsartRegisters, SR_RXNE, SR_TC, SR_TXE};

/// 模拟 GPIO 端口
///
/// IDR 读取时，输出模式的引脚回读 ODR，其余引脚读外部电平。
pub struct MockPort {
    regs: [u32; 8],
    external: u32,
    writes: Vec<(Register, u32)>,
}

impl MockPort {
    pub fn new() -> Self {
        MockPort {
            regs: [0; 8],
            external: 0,
            writes: Vec::new(),
        }
    }

    /// 指定寄存器复位值
    pub fn with_reset(values: &[(Register, u32)]) -> Self {
        let mut port = MockPort::new();
        for &(register, value) in values {
            port.regs[register as usize] = value;
        }
        port
    }

    pub fn get(&self, register: Register) -> u32 {
        self.regs[register as usize]
    }

    pub fn snapshot(&self) -> [u32; 8] {
        self.regs
    }

    /// 外部电路驱动引脚电平
    pub fn drive(&mut self, pin: Pin, level: bool) {
        if level {
            self.external |= pin.mask();
        } else {
            self.external &= !pin.mask();
        }
    }

    /// 按顺序记录的寄存器写入
    pub fn written(&self) -> Vec<Register> {
        self.writes.iter().map(|&(register, _)| register).collect()
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
    }

    fn output_mask(&self) -> u32 {
        let moder = self.regs[Register::Mode as usize];
        (0..16u32)
            .filter(|pin| (moder >> (pin * 2)) & 0b11 == 0b01)
            .fold(0, |mask, pin| mask | 1 << pin)
    }
}

impl PortRegisters for MockPort {
    fn read(&self, register: Register) -> u32 {
        match register {
            Register::InputData => {
                let outputs = self.output_mask();
                (self.regs[Register::OutputData as usize] & outputs) | (self.external & !outputs)
            }
            _ => self.regs[register as usize],
        }
    }

    fn write(&mut self, register: Register, value: u32) {
        self.writes.push((register, value));
        if register != Register::InputData {
            self.regs[register as usize] = value;
        }
    }
}

/// 模拟 USART
pub struct MockUsart {
    /// 待接收的字节
    pub rx: VecDeque<u8>,
    /// 已发送的字节
    pub tx: Vec<u8>,
    /// 每发送一个字节后 TXE 保持为 0 的轮询次数
    pub tx_busy_polls: u32,
    /// 下一次读 SR 时附带的错误标志，读 DR 后清除
    pub error_flags: u32,
    pub brr: u32,
    pub enabled: bool,
    tx_wait: Cell<u32>,
}

impl MockUsart {
    pub fn new() -> Self {
        MockUsart {
            rx: VecDeque::new(),
            tx: Vec::new(),
            tx_busy_polls: 0,
            error_flags: 0,
            brr: 0,
            enabled: false,
            tx_wait: Cell::new(0),
        }
    }

    pub fn with_input(input: &[u8]) -> Self {
        let mut usart = MockUsart::new();
        usart.rx.extend(input.iter().copied());
        usart
    }
}

impl UsartRegisters for MockUsart {
    fn status(&self) -> u32 {
        let mut sr = self.error_flags;
        if !self.rx.is_empty() {
            sr |= SR_RXNE;
        }
        match self.tx_wait.get() {
            0 => sr |= SR_TXE | SR_TC,
            n => self.tx_wait.set(n - 1),
        }
        sr
    }

    fn read_data(&mut self) -> u8 {
        self.error_flags = 0;
        self.rx.pop_front().unwrap_or(0)
    }

    fn write_data(&mut self, byte: u8) {
        self.tx.push(byte);
        self.tx_wait.set(self.tx_busy_polls);
    }

    fn set_baud_divisor(&mut self, divisor: u32) {
        self.brr = divisor;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }
}
