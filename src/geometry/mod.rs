// geometry/mod.rs
// 导出相机、投影和三角形测试相关模块
pub mod camera;
pub mod culling;
pub mod interpolation;
pub mod transform;
