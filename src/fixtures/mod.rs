pub mod api_football;
pub mod error;
pub mod models;
pub mod provider;

pub use api_football::{ApiFootball, FixtureQuery};
pub use error::FixtureError;
pub use models::{Fixture, FixtureSet, FixtureStatus};
pub use provider::FixtureSource;
