#![allow(dead_code)]

pub mod camera;
pub mod components;
pub mod events;
pub mod input;
pub mod loading;
pub mod maps;
pub mod systems;
pub mod world;
