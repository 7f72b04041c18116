pub mod mastery_service;

pub use mastery_service::MasteryService;
