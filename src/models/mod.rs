pub mod distance;
pub mod matching;
pub mod place;
pub mod pool;
pub mod route;
