//! Borg 备份仓库的编排层：运行备份引擎进程、转发输出，
//! 并维护已配置仓库的持久化登记表。

pub mod shared;
pub mod domain;
pub mod ports;
pub mod infrastructure;
pub mod services;

#[cfg(test)]
pub mod testing;
