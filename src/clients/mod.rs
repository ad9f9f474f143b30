pub mod grid_client;
