pub mod migrations;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;
