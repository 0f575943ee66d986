mod async_test;
mod config_test;
mod count_exists_test;
mod find_test;
mod resolution_test;
