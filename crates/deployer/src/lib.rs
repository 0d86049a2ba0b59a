// Deployment targets (Firebase Hosting through its CLI)

pub mod firebase;

use async_trait::async_trait;
use hosting_deploy_core::{ChannelDeployResult, DeployConfig, ProductionConfig, ProductionDeployResult, Result};

pub use firebase::FirebaseCli;

#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploy to a preview channel
    async fn deploy_preview(&self, config: &DeployConfig) -> Result<ChannelDeployResult>;

    /// Deploy to the live channel
    async fn deploy_production(&self, config: &ProductionConfig) -> Result<ProductionDeployResult>;
}
