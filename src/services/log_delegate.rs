use async_trait::async_trait;
use tracing::{info, warn};
use crate::ports::delegate::CommandDelegate;
use crate::ports::process::Termination;

/// 将进程输出写入日志，并记住最后一行 stderr
#[derive(Debug)]
pub struct LogDelegate {
    label: String,
    last_stderr: Option<String>,
}

impl LogDelegate {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_stderr: None,
        }
    }
}

#[async_trait]
impl CommandDelegate for LogDelegate {
    async fn on_stdout_line(&mut self, line: &str) {
        info!("[{}] {}", self.label, line);
    }

    async fn on_stderr_line(&mut self, line: &str) {
        warn!("[{}] {}", self.label, line);
        self.last_stderr = Some(line.to_string());
    }

    async fn on_terminated(&mut self, termination: &Termination) {
        if termination.success() {
            info!("[{}] {}", self.label, termination);
        } else {
            warn!("[{}] {}", self.label, termination);
        }
    }

    fn last_error(&self) -> Option<String> {
        self.last_stderr.clone()
    }
}
