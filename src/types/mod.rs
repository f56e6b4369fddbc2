pub mod github_types;
