// materials/mod.rs
// 导出网格数据与纹理处理相关模块
pub mod model_types;
pub mod texture;
