mod derive_test;
mod repository_test;
