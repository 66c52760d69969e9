pub mod petstore;
