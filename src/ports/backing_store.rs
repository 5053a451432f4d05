use std::sync::Arc;
use crate::domain::value_objects::Location;

/// 存储后端（本地目录、对象存储等）
pub trait BackingStore: Send + Sync {
    fn id(&self) -> &str;

    /// 转换为备份引擎可识别的仓库地址
    fn repository_url(&self, location: &Location) -> String;
}

/// 按标识查找存储后端
pub trait BackingStoreRegistry: Send + Sync {
    fn resolve(&self, id: &str) -> Option<Arc<dyn BackingStore>>;

    fn ids(&self) -> Vec<String>;
}
