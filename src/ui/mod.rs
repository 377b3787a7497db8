// UI模块主文件
pub mod app;
pub mod controls;

// 为了方便直接调用，从app模块导出启动函数
pub use app::start_gui;
