// 渲染核心模块
pub mod frame_buffer;
pub mod geometry_store;
pub mod rasterizer;
pub mod renderer;
