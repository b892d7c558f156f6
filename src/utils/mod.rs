// utils/mod.rs
// 导出帧输出相关工具函数
pub mod save_utils;
