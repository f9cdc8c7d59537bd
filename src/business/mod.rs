pub mod filter;
pub mod profile;
pub mod store;
pub mod template;

pub use filter::{filter_by_business, BusinessScoped};
pub use profile::{parse_compliance_settings, BusinessProfile, ComplianceParse, ComplianceSettings};
pub use store::{ActiveProfileStore, ProfileState};
pub use template::ContentTemplate;
