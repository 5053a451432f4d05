use async_trait::async_trait;
use crate::ports::process::Termination;

/// 进程事件的接收方
///
/// 所有回调由同一个调度任务依次调用，实现无需自行加锁。
#[async_trait]
pub trait CommandDelegate: Send {
    async fn on_stdout_line(&mut self, _line: &str) {}

    async fn on_stderr_line(&mut self, _line: &str) {}

    /// 两路输出均排空后调用，且只调用一次
    async fn on_terminated(&mut self, _termination: &Termination) {}

    /// 失败时可供上层记录的错误描述
    fn last_error(&self) -> Option<String> {
        None
    }
}

/// 调用方未提供 delegate 时使用
#[derive(Debug, Default)]
pub struct NoopDelegate;

impl CommandDelegate for NoopDelegate {}
