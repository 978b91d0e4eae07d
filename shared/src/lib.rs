pub mod github;

#[cfg(feature = "client")]
pub mod slack;

pub type GithubHandle = String;
