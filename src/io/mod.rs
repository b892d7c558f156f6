// io/mod.rs
// 导出配置、命令行与模型加载相关模块
pub mod config_loader;
pub mod obj_loader;
pub mod render_settings;
pub mod simple_cli;
