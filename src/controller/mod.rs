pub(crate) mod accordion;
pub(crate) mod opts;
