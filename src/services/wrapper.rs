use async_trait::async_trait;
use crate::ports::delegate::CommandDelegate;
use crate::ports::process::Termination;

/// 附加在终止事件上的动作
#[async_trait]
pub trait TerminationAction: Send {
    /// 进程以退出码 0 结束后调用
    async fn on_success(&mut self);

    /// 其余所有终止方式
    async fn on_failure(&mut self, termination: &Termination, last_error: Option<String>);
}

/// 装饰另一个 delegate：所有事件先转发给内层，终止后再执行附加动作
///
/// 链条是线性的，每层独占下一层。
pub struct WrapperDelegate {
    inner: Box<dyn CommandDelegate>,
    action: Box<dyn TerminationAction>,
    last_stderr: Option<String>,
}

impl WrapperDelegate {
    pub fn new(inner: Box<dyn CommandDelegate>, action: Box<dyn TerminationAction>) -> Self {
        Self {
            inner,
            action,
            last_stderr: None,
        }
    }
}

#[async_trait]
impl CommandDelegate for WrapperDelegate {
    async fn on_stdout_line(&mut self, line: &str) {
        self.inner.on_stdout_line(line).await;
    }

    async fn on_stderr_line(&mut self, line: &str) {
        self.inner.on_stderr_line(line).await;
        self.last_stderr = Some(line.to_string());
    }

    async fn on_terminated(&mut self, termination: &Termination) {
        self.inner.on_terminated(termination).await;

        if termination.success() {
            self.action.on_success().await;
        } else {
            let last_error = self.last_error();
            self.action.on_failure(termination, last_error).await;
        }
    }

    /// 优先使用内层报告的错误，否则取最后一行 stderr
    fn last_error(&self) -> Option<String> {
        self.inner.last_error().or_else(|| self.last_stderr.clone())
    }
}
