mod curriculum;
mod group;
mod link;
mod person;
mod report;
mod section;
mod session;

pub use curriculum::CurriculumCommands;
pub use group::GroupCommands;
pub use link::LinkCommands;
pub use person::PersonCommands;
pub use report::ReportCommands;
pub use section::SectionCommands;
pub use session::SessionCommands;
