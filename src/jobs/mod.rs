// Jobs module - Background maintenance

pub mod request_expirer;
