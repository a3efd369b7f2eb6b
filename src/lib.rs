pub mod api;
pub mod banner;
pub mod commands;
pub mod config;
pub mod consts;
pub mod demo;
pub mod events;
pub mod gateway;
pub mod router;
pub mod screens;
pub mod session;
