use async_trait::async_trait;
use std::fmt;

/// 进程超时时报告的退出码（与 coreutils `timeout` 一致）
pub const TIMED_OUT_CODE: i32 = 124;

/// 进程无法启动时报告的退出码
pub const SPAWN_FAILED_CODE: i32 = 127;

/// 进程的终止方式，随 `on_terminated` 交付给 delegate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// 正常退出，携带退出码
    Completed(i32),
    /// 被调用方取消，携带操作系统报告的退出码（被信号杀死时为 None）
    Cancelled(Option<i32>),
    /// 超时后被杀死
    TimedOut,
    /// 无法启动
    SpawnFailed(String),
}

impl Termination {
    pub fn code(&self) -> i32 {
        match self {
            Termination::Completed(rc) => *rc,
            Termination::Cancelled(rc) => rc.unwrap_or(-1),
            Termination::TimedOut => TIMED_OUT_CODE,
            Termination::SpawnFailed(_) => SPAWN_FAILED_CODE,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Termination::Completed(0))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Completed(rc) => write!(f, "exited with code {}", rc),
            Termination::Cancelled(Some(rc)) => write!(f, "cancelled (code {})", rc),
            Termination::Cancelled(None) => write!(f, "cancelled"),
            Termination::TimedOut => write!(f, "timed out"),
            Termination::SpawnFailed(reason) => write!(f, "failed to start: {}", reason),
        }
    }
}

/// 进程生命周期状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Created,
    Running,
    Completed(i32),
    Failed(String),
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Completed(_) | ProcessState::Failed(_))
    }
}

impl From<&Termination> for ProcessState {
    fn from(termination: &Termination) -> Self {
        match termination {
            Termination::Completed(rc) => ProcessState::Completed(*rc),
            other => ProcessState::Failed(other.to_string()),
        }
    }
}

/// 后端返回给调用方的进程句柄
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    /// 等待进程进入终止状态；终止后再次调用立即返回
    async fn join(&self) -> ProcessState;

    /// 请求终止子进程，终止通知仍会送达
    fn cancel(&self);

    fn state(&self) -> ProcessState;

    /// 最近一行 stderr 输出，或启动失败原因
    fn last_error(&self) -> Option<String>;
}
