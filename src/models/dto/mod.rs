pub mod request;

pub use request::GenerateQuizzesRequest;
