mod declfile;
mod requirement;
mod spec;

pub use declfile::{DeclarationFile, DeclaredOptions, PackageRecord};
pub use requirement::Requirement;
pub use spec::PackageSpec;
