pub mod config;
pub mod consts;
pub mod io;
pub mod keyboard;
pub mod layouts;
pub mod mods;
pub mod pipeline;
pub mod resolver;
