use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;
use crate::ports::delegate::CommandDelegate;
use crate::ports::process::{ProcessHandle, ProcessState, Termination};

/// 输出通道容量；调度任务持续消费，满时仅让读取方短暂等待
const LINE_BUFFER: usize = 64;

/// 子进程退出后等待输出排空的上限，超过后杀死仍持有管道的后代进程
const DRAIN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// 句柄与后台任务共享的状态
struct Shared {
    state: Mutex<ProcessState>,
    /// `on_terminated` 返回后置为 true，`join` 等待它
    finished: watch::Sender<bool>,
    last_error: Mutex<Option<String>>,
    cancel: CancellationToken,
}

impl Shared {
    fn set_last_error(&self, message: String) {
        *self.last_error.lock() = Some(message);
    }

    fn set_state(&self, state: ProcessState) {
        *self.state.lock() = state;
    }
}

/// 在后台运行外部命令
///
/// stdout 与 stderr 各由一个读取任务按行读取，经同一个 channel 送到调度任务，
/// 调度任务独占 delegate 并依次回调，因此 delegate 的回调不会并发执行。
/// 每一路内部保持输出顺序，两路之间不保证先后。两路都排空且进程退出后，
/// 才调用一次 `on_terminated`；`join` 在它返回且 delegate 被丢弃后才返回。
///
/// Unix 下子进程单独成组，取消与超时会杀死整个进程组。
pub struct CommandProcess {
    id: Uuid,
    command: Vec<String>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
    timeout: Option<Duration>,
    /// 启动前持有，启动时移交给调度任务
    delegate: Mutex<Option<Box<dyn CommandDelegate>>>,
    shared: Arc<Shared>,
}

impl CommandProcess {
    pub fn new(command: Vec<String>, delegate: Box<dyn CommandDelegate>) -> Self {
        let (finished, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            command,
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            delegate: Mutex::new(Some(delegate)),
            shared: Arc::new(Shared {
                state: Mutex::new(ProcessState::Created),
                finished,
                last_error: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_envs(mut self, vars: &HashMap<String, String>) -> Self {
        self.env.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// 超时后杀死进程组并报告 `Termination::TimedOut`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 启动进程，不阻塞调用方
    ///
    /// 必须在 tokio runtime 内调用。启动失败不会返回错误：状态立即变为 `Failed`，
    /// 并经 delegate 报告。
    pub fn start(&mut self) {
        let Some(mut delegate) = self.delegate.get_mut().take() else {
            warn!("Command {} already started", self.id);
            return;
        };
        let shared = Arc::clone(&self.shared);
        let span = tracing::info_span!("command", id = %self.id);

        let child = match self.spawn() {
            Ok(child) => child,
            Err(reason) => {
                error!(parent: &span, "Failed to start {:?}: {}", self.command, reason);
                let termination = Termination::SpawnFailed(reason.clone());
                shared.set_last_error(reason);
                shared.set_state(ProcessState::from(&termination));
                tokio::spawn(
                    async move {
                        delegate.on_terminated(&termination).await;
                        drop(delegate);
                        shared.finished.send_replace(true);
                    }
                    .instrument(span),
                );
                return;
            }
        };

        info!(parent: &span, "Started {:?} (pid {:?})", self.command, child.id());
        shared.set_state(ProcessState::Running);
        tokio::spawn(supervise(child, delegate, shared, self.timeout).instrument(span));
    }

    fn spawn(&self) -> std::result::Result<Child, String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| "empty command".to_string())?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.spawn().map_err(|e| format!("{}: {}", program, e))
    }
}

impl std::fmt::Debug for CommandProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandProcess")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("state", &*self.shared.state.lock())
            .finish()
    }
}

#[async_trait]
impl ProcessHandle for CommandProcess {
    async fn join(&self) -> ProcessState {
        if self.delegate.lock().is_some() {
            warn!("join() on command {} that was never started", self.id);
            return self.state();
        }
        let mut rx = self.shared.finished.subscribe();
        let finished = rx.wait_for(|done| *done).await.is_ok();
        if !finished {
            warn!("Supervisor of command {} went away", self.id);
        }
        self.state()
    }

    fn cancel(&self) {
        debug!("Cancelling command {}", self.id);
        self.shared.cancel.cancel();
    }

    fn state(&self) -> ProcessState {
        self.shared.state.lock().clone()
    }

    fn last_error(&self) -> Option<String> {
        self.shared.last_error.lock().clone()
    }
}

async fn supervise(
    mut child: Child,
    mut delegate: Box<dyn CommandDelegate>,
    shared: Arc<Shared>,
    timeout: Option<Duration>,
) {
    let group = child.id();
    let (tx, mut rx) = mpsc::channel(LINE_BUFFER);
    let mut pumps: Vec<JoinHandle<()>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(tokio::spawn(pump(stdout, tx.clone(), OutputLine::Stdout)));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(tokio::spawn(pump(stderr, tx.clone(), OutputLine::Stderr)));
    }
    drop(tx);

    let deadline = async move {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut pumps_open = true;
    let mut exit: Option<Option<i32>> = None;
    let mut drain_until: Option<Instant> = None;
    let mut cancelled = false;
    let mut timed_out = false;

    while pumps_open || exit.is_none() {
        tokio::select! {
            line = rx.recv(), if pumps_open => match line {
                Some(line) => dispatch(delegate.as_mut(), &shared, line).await,
                None => pumps_open = false,
            },
            status = child.wait(), if exit.is_none() => {
                exit = Some(match status {
                    Ok(status) => status.code(),
                    Err(e) => {
                        error!("Failed to wait for child: {}", e);
                        shared.set_last_error(e.to_string());
                        None
                    }
                });
                drain_until = Some(Instant::now() + DRAIN_GRACE);
            }
            _ = shared.cancel.cancelled(), if exit.is_none() && !cancelled && !timed_out => {
                cancelled = true;
                kill_group(&mut child, group);
            }
            _ = &mut deadline, if exit.is_none() && !cancelled && !timed_out => {
                timed_out = true;
                warn!("Command timed out, killing process group");
                kill_group(&mut child, group);
            }
            _ = tokio::time::sleep_until(drain_until.unwrap_or_else(Instant::now)),
                if pumps_open && drain_until.is_some() =>
            {
                warn!("Output still open {:?} after exit, killing leftover processes", DRAIN_GRACE);
                kill_group(&mut child, group);
                for pump in &pumps {
                    pump.abort();
                }
                while let Ok(line) = rx.try_recv() {
                    dispatch(delegate.as_mut(), &shared, line).await;
                }
                pumps_open = false;
            }
        }
    }

    let code = exit.flatten();
    let termination = if timed_out {
        Termination::TimedOut
    } else if cancelled {
        Termination::Cancelled(code)
    } else {
        Termination::Completed(code.unwrap_or(-1))
    };

    info!("Command terminated: {}", termination);
    shared.set_state(ProcessState::from(&termination));
    delegate.on_terminated(&termination).await;
    // delegate 持有的资源在 join 返回前释放
    drop(delegate);
    shared.finished.send_replace(true);
}

async fn dispatch(delegate: &mut dyn CommandDelegate, shared: &Shared, line: OutputLine) {
    match line {
        OutputLine::Stdout(line) => {
            debug!("stdout: {}", line);
            delegate.on_stdout_line(&line).await;
        }
        OutputLine::Stderr(line) => {
            debug!("stderr: {}", line);
            shared.set_last_error(line.clone());
            delegate.on_stderr_line(&line).await;
        }
    }
}

/// 杀死子进程所在的进程组，后代进程一并结束
#[cfg(unix)]
fn kill_group(child: &mut Child, group: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pgid) = group.and_then(|id| i32::try_from(id).ok()) {
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => return,
            Err(e) => warn!("Failed to kill process group {}: {}", pgid, e),
        }
    }
    if let Err(e) = child.start_kill() {
        debug!("Failed to kill child: {}", e);
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child, _group: Option<u32>) {
    if let Err(e) = child.start_kill() {
        debug!("Failed to kill child: {}", e);
    }
}

/// 按行读取，去掉行尾的 `\n` / `\r\n`；非 UTF-8 内容做有损转换
async fn pump<R>(reader: R, tx: mpsc::Sender<OutputLine>, wrap: fn(String) -> OutputLine)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(wrap(line)).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Failed to read child output: {}", e);
                break;
            }
        }
    }
}
