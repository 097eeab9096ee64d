pub mod config;
pub mod demo_seeder;
pub mod error;
pub mod routes;
pub mod state;
pub mod db {
    pub mod connector;
    #[cfg(test)]
    pub mod mock;
    pub mod models;
    pub mod repository;
}
pub mod api {
    pub mod blog;
    pub mod create;
    pub mod destinations;
    pub mod errors;
    pub mod health;
    pub mod listing;
    pub mod packages;
    pub mod query;
    pub mod reshape;
    pub mod response;
}
