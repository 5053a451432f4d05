/// 统一的错误类型
#[derive(Debug, thiserror::Error)]
pub enum BorgxError {
    /// 仓库名称为空
    #[error("Repository name must not be empty")]
    NameEmpty,

    /// 仓库名称已被占用
    #[error("Repository name already taken: {0}")]
    NameTaken(String),

    /// 仓库未找到
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// 后端不支持的加密模式
    #[error("Unsupported encryption mode: {0}")]
    UnsupportedEncryption(String),

    /// 加密模式需要口令，但口令为空
    #[error("Encryption mode {0} requires a passphrase")]
    PassphraseRequired(String),

    /// 未知的存储后端
    #[error("Unknown backing store: {0}")]
    UnknownBackingStore(String),

    /// 输入结构不符合预期
    #[error("Invalid type: {0}")]
    InvalidType(String),

    /// 持久化的配置已损坏
    #[error("Corrupted config: {0}")]
    CorruptedConfig(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 设置文件解析错误
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anyhow 错误兼容
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BorgxError {
    /// 是否为同步校验错误（名称、加密模式）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BorgxError::NameEmpty
                | BorgxError::NameTaken(_)
                | BorgxError::UnsupportedEncryption(_)
                | BorgxError::PassphraseRequired(_)
                | BorgxError::UnknownBackingStore(_)
        )
    }
}

/// 从字符串创建配置错误
impl From<String> for BorgxError {
    fn from(s: String) -> Self {
        BorgxError::Config(s)
    }
}

/// 从 &str 创建配置错误
impl From<&str> for BorgxError {
    fn from(s: &str) -> Self {
        BorgxError::Config(s.to_string())
    }
}
