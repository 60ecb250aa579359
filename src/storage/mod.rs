pub mod backend;

pub use backend::SeaOrmStorage;
