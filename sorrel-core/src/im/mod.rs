mod boxes;
pub mod draw;
mod image;
mod mask;
mod polygons;

pub use self::image::open_rgb;
pub use self::image::save_rgb;

pub use boxes::BoundingBoxes;
pub use polygons::Polygons;

pub use mask::LabelMap;
