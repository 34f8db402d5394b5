//! 破坏性操作的确认能力
//!
//! 存储层只关心“是否确认”，由调用方决定确认的方式：
//! 阻塞式提示、请求中的标志位，或测试里的固定返回值。

/// 确认能力
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// 固定答复，用于请求标志位和测试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
