pub mod question;
pub mod response;
pub mod upload;
