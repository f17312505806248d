pub(crate) mod composite_cache;
