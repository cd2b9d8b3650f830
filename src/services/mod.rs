pub mod classifier;
pub mod legend;
pub mod nowcast;
pub mod radar;
pub mod timeline;
pub mod wms;
