// scene/mod.rs
// 导出场景构建相关模块
pub mod scene_utils;
