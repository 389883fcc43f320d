pub mod pages;
pub mod overlays;
