pub(crate) mod perspective;
pub(crate) mod warp;
