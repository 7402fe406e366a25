//! AWS adapters for the storefront.
//!
//! - `sigv4`: Signature Version 4 request signing
//! - `client`: a JSON 1.1 protocol client (`AwsJsonClient`)
//! - `cognito`: the user pool as a `UserDirectory`, plus self-service sign-up
//! - `codedeploy`: the deployment controller as a `LifecycleReporter`

pub mod client;
pub mod codedeploy;
pub mod cognito;
pub mod config;
pub mod error;
pub mod sigv4;

pub use client::{AwsJsonClient, CODEDEPLOY, COGNITO_IDP, ServiceDescriptor};
pub use codedeploy::CodeDeployReporter;
pub use cognito::{
    CognitoDirectory, CognitoSignUp, PoolIssuer, SignUpOutcome, SignUpRequest, secret_hash,
};
pub use config::AwsConfig;
pub use error::AwsError;
pub use sigv4::{Credentials, Signer};
