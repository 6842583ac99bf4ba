//! 串口轮询工具

use super::Error;

/// 阻塞收发的等待期限
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Deadline {
    /// 一直等待，硬件无响应时永不返回
    #[default]
    Forever,
    /// 最多轮询 n 次状态寄存器，之后返回 [`Error::Timeout`]
    Polls(u32),
}

/// 反复调用非阻塞操作，直到完成、出错或超过期限
pub fn wait<T>(
    deadline: Deadline,
    mut op: impl FnMut() -> nb::Result<T, Error>,
) -> Result<T, Error> {
    match deadline {
        Deadline::Forever => nb::block!(op()),
        Deadline::Polls(polls) => {
            for _ in 0..polls {
                match op() {
                    Ok(value) => return Ok(value),
                    Err(nb::Error::Other(e)) => return Err(e),
                    Err(nb::Error::WouldBlock) => {}
                }
            }
            warn!("USART timeout after {} polls", polls);
            Err(Error::Timeout)
        }
    }
}
