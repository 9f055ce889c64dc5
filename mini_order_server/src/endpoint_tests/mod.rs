mod helpers;
mod mocks;

mod access_control;
mod menu;
mod misc;
mod orders;
