//! Top-level client.
//!
//! # Data Flow
//! ```text
//! UnisonClient::connect(project id, options)
//!     → ServerClient (login, getProject)
//!     → Project (registrar, RPC URL, chain id)
//!     → ChainConnection (read-only, or signing when a key was given)
//! UnisonClient::blockchain()
//!     → UnisonBlockchain bound to the registrar (built once, then cached)
//! ```

use std::str::FromStr;

use crate::blockchain::wallet::{Wallet, PRIVATE_KEY_ENV_VAR};
use crate::blockchain::{ChainConnection, UnisonBlockchain};
use crate::config::{BlockchainConfig, UnisonConfig};
use crate::error::{UnisonError, UnisonResult};
use crate::server::{Project, ProjectId, ServerClient};

/// Options for [`UnisonClient::connect`].
#[derive(Clone, Default)]
pub struct ConnectOptions {
    /// Hex private key. Without one the connection is read-only.
    pub private_key: Option<String>,
}

impl ConnectOptions {
    pub fn with_private_key(private_key: impl Into<String>) -> Self {
        Self {
            private_key: Some(private_key.into()),
        }
    }

    /// Read the private key from `DATA_UNISON_PRIVATE_KEY`, if set.
    pub fn from_env() -> Self {
        Self {
            private_key: std::env::var(PRIVATE_KEY_ENV_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn not_connected() -> UnisonError {
    UnisonError::NotAuthorized("Not connected, call connect first".into())
}

/// Entry point of the SDK: one project registry session and, once
/// requested, one contract client.
pub struct UnisonClient {
    settings: BlockchainConfig,
    server: ServerClient,
    project: Option<Project>,
    wallet: Option<Wallet>,
    connection: Option<ChainConnection>,
    blockchain: Option<UnisonBlockchain>,
}

impl UnisonClient {
    /// Create a disconnected client.
    pub fn new(api_key: impl Into<String>, config: UnisonConfig) -> UnisonResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(UnisonError::InvalidArgument("No API Key provided".into()));
        }

        let server = ServerClient::new(&config.server.endpoint, api_key)?;
        Ok(Self {
            settings: config.blockchain,
            server,
            project: None,
            wallet: None,
            connection: None,
            blockchain: None,
        })
    }

    /// Log in for `project_id` and resolve its contracts and network.
    ///
    /// Calling again for the connected project only applies a new private
    /// key, if one is given. Calling for another project starts over.
    pub async fn connect(&mut self, project_id: &str, options: ConnectOptions) -> UnisonResult<()> {
        let project_id = ProjectId::from_str(project_id)?;
        let wallet = options
            .private_key
            .as_deref()
            .map(Wallet::from_private_key)
            .transpose()?;

        if self.connected_to(project_id) {
            if let Some(wallet) = wallet {
                self.install_wallet(wallet)?;
            }
            return Ok(());
        }

        if self.server.project_id().is_some_and(|current| current != project_id) {
            tracing::info!(
                from = ?self.server.project_id(),
                to = %project_id,
                "Switching project, dropping current session"
            );
            self.reset();
        }

        self.server.connect(project_id).await?;
        let project = self.server.get_project(project_id).await?;
        let connection = match &wallet {
            Some(wallet) => ChainConnection::signing(project.rpc_url.clone(), wallet),
            None => ChainConnection::read_only(project.rpc_url.clone()),
        };

        tracing::info!(
            project_id = %project_id,
            chain_id = project.chain_id.0,
            signer = connection.is_signer(),
            "Connected"
        );
        self.project = Some(project);
        self.wallet = wallet;
        self.connection = Some(connection);
        self.blockchain = None;
        Ok(())
    }

    /// Swap the signing identity of the connected project.
    pub fn set_private_key(&mut self, private_key: &str) -> UnisonResult<()> {
        if self.project.is_none() {
            return Err(not_connected());
        }
        let wallet = Wallet::from_private_key(private_key)?;
        self.install_wallet(wallet)
    }

    /// Replace the API key used for the next login.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> UnisonResult<()> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(UnisonError::InvalidArgument("No API Key provided".into()));
        }
        self.server.set_api_key(api_key);
        Ok(())
    }

    /// Refresh the registry access token. See [`ServerClient::refresh`].
    pub async fn refresh(&mut self) -> bool {
        self.server.refresh().await
    }

    /// The contract client for the connected project.
    ///
    /// Built on first use and cached; later calls return the same instance.
    pub fn blockchain(&mut self) -> UnisonResult<&mut UnisonBlockchain> {
        let chain = match self.blockchain.take() {
            Some(chain) => chain,
            None => self.build_blockchain()?,
        };
        Ok(self.blockchain.insert(chain))
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn server(&self) -> &ServerClient {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut ServerClient {
        &mut self.server
    }

    /// Address of the signing wallet, if one is installed.
    pub fn signer_address(&self) -> Option<alloy::primitives::Address> {
        self.wallet.as_ref().map(Wallet::address)
    }

    /// True once login and project lookup both succeeded.
    pub fn is_connected(&self) -> bool {
        self.server.is_connected() && self.project.is_some()
    }

    fn connected_to(&self, project_id: ProjectId) -> bool {
        self.is_connected() && self.project.as_ref().map(|p| p.id) == Some(project_id)
    }

    fn build_blockchain(&self) -> UnisonResult<UnisonBlockchain> {
        if !self.server.is_connected() {
            return Err(not_connected());
        }
        let (project, connection) = match (&self.project, &self.connection) {
            (Some(project), Some(connection)) => (project, connection),
            _ => return Err(not_connected()),
        };

        Ok(UnisonBlockchain::new(project.chain_id, project.registrar()?, connection.clone())
            .with_settings(self.settings.clone()))
    }

    fn install_wallet(&mut self, wallet: Wallet) -> UnisonResult<()> {
        let project = self.project.as_ref().ok_or_else(not_connected)?;
        let connection = ChainConnection::signing(project.rpc_url.clone(), &wallet);

        if let Some(chain) = self.blockchain.as_mut() {
            chain.rebind(connection.clone());
        }
        self.connection = Some(connection);
        self.wallet = Some(wallet);
        Ok(())
    }

    fn reset(&mut self) {
        self.server.disconnect();
        self.project = None;
        self.wallet = None;
        self.connection = None;
        self.blockchain = None;
    }
}

impl std::fmt::Debug for UnisonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnisonClient")
            .field("server", &self.server)
            .field("project", &self.project)
            .field("wallet", &self.wallet)
            .field("blockchain", &self.blockchain)
            .finish()
    }
}
