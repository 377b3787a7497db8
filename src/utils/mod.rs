// utils/mod.rs
// 图像导出与文件保存工具
pub mod image_utils;
pub mod save_utils;
