use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::shared::error::BorgxError;

/// 仓库位置值对象：存储后端标识 + 后端内路径
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "backingstore")]
    backing_store_id: String,
    path: String,
}

impl Location {
    pub fn new(backing_store_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            backing_store_id: backing_store_id.into(),
            path: path.into(),
        }
    }

    pub fn backing_store_id(&self) -> &str {
        &self.backing_store_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.backing_store_id, self.path)
    }
}

/// 加密模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionMode {
    None,
    Authenticated,
    AuthenticatedBlake2,
    Repokey,
    Keyfile,
    RepokeyBlake2,
    KeyfileBlake2,
}

impl EncryptionMode {
    pub const ALL: [EncryptionMode; 7] = [
        EncryptionMode::None,
        EncryptionMode::Authenticated,
        EncryptionMode::AuthenticatedBlake2,
        EncryptionMode::Repokey,
        EncryptionMode::Keyfile,
        EncryptionMode::RepokeyBlake2,
        EncryptionMode::KeyfileBlake2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMode::None => "none",
            EncryptionMode::Authenticated => "authenticated",
            EncryptionMode::AuthenticatedBlake2 => "authenticated-blake2",
            EncryptionMode::Repokey => "repokey",
            EncryptionMode::Keyfile => "keyfile",
            EncryptionMode::RepokeyBlake2 => "repokey-blake2",
            EncryptionMode::KeyfileBlake2 => "keyfile-blake2",
        }
    }

    /// 是否需要口令
    pub fn requires_passphrase(&self) -> bool {
        !matches!(self, EncryptionMode::None)
    }
}

impl FromStr for EncryptionMode {
    type Err = BorgxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| BorgxError::UnsupportedEncryption(s.to_string()))
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
