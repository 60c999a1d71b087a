// HTTP endpoints

pub mod test_api;
