pub mod contract;
pub mod crud;
pub mod dcim;
pub mod error;
pub mod hardware;
pub mod health;
pub mod openapi;
pub mod provider;
pub mod report;
pub mod software;
pub mod validated_software;
pub mod validation_result;
