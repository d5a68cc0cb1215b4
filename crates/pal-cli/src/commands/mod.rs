pub mod assign;
pub mod audit;
pub mod curriculum;
pub mod dispatch;
pub mod evaluate;
pub mod group;
pub mod import;
pub mod init;
pub mod link;
pub mod person;
pub mod progress;
pub mod report;
pub mod section;
pub mod session;
pub mod shared;
