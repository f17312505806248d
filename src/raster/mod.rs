pub(crate) mod composite;
pub(crate) mod image;
pub(crate) mod rasterize;
pub(crate) mod surface;
