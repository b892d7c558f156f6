pub mod frame_buffer;
pub mod geometry_processor;
pub mod graph_controller;
pub mod rasterizer;
pub mod renderer;
pub mod tile_grid;
pub mod tile_worker;
