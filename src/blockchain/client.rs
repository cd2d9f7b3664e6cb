//! Validated client for the registrar, summary and interaction contracts.
//!
//! # Responsibilities
//! - Bind the registrar, then a summary resolved through it
//! - Validate arguments and permissions before any transaction is built
//! - Issue view calls and confirmed writes through one pair of helpers
//! - Normalise provider failures into [`UnisonError`]

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{PendingTransactionError, Provider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::SolCall;
use std::time::Duration;

use crate::blockchain::abi::{self, ContractKind, IInteraction, IRegistrar, ISummary};
use crate::blockchain::connection::ChainConnection;
use crate::blockchain::errors::parse_rpc_error;
use crate::blockchain::guard::Check;
use crate::blockchain::types::{ChainId, Interaction, Role};
use crate::config::BlockchainConfig;
use crate::error::{UnisonError, UnisonResult};
use crate::observability::metrics;
use crate::utils;

/// Which contracts are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Registrar,
    Summary(Address),
}

/// Contract client bound to one registrar and, once connected, one summary.
pub struct UnisonBlockchain {
    chain_id: ChainId,
    registrar: Address,
    connection: ChainConnection,
    binding: Binding,
    settings: BlockchainConfig,
}

fn summary_missing() -> UnisonError {
    UnisonError::NotFound("Summary contract is not found".into())
}

fn not_found() -> UnisonError {
    UnisonError::NotFound("The interactionId is not found".into())
}

fn to_u64(value: U256, what: &str) -> UnisonResult<u64> {
    u64::try_from(value).map_err(|_| UnisonError::Remote(format!("{} does not fit in u64", what)))
}

/// Build the `assignTemporaryViewer` call for a viewing window starting at `now`.
pub fn temporary_viewer_call(
    index: u64,
    entity: Address,
    level: U256,
    duration_secs: f64,
    now: u64,
) -> UnisonResult<ISummary::assignTemporaryViewerCall> {
    let duration = utils::duration_secs(duration_secs)?;
    let deadline = utils::deadline_after(now, duration)?;
    Ok(ISummary::assignTemporaryViewerCall {
        _id: U256::from(index),
        _entity: entity,
        _level: level,
        _deadline: U256::from(deadline),
    })
}

impl UnisonBlockchain {
    /// Create a client bound to `registrar`.
    pub fn new(chain_id: ChainId, registrar: Address, connection: ChainConnection) -> Self {
        tracing::info!(
            chain_id = chain_id.0,
            registrar = %registrar,
            signer = connection.is_signer(),
            "Blockchain client bound to registrar"
        );
        Self {
            chain_id,
            registrar,
            connection,
            binding: Binding::Registrar,
            settings: BlockchainConfig::default(),
        }
    }

    /// Override confirmation and receipt-timeout settings.
    pub fn with_settings(mut self, settings: BlockchainConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn registrar(&self) -> Address {
        self.registrar
    }

    /// Address of the bound summary contract, if any.
    pub fn summary(&self) -> Option<Address> {
        match self.binding {
            Binding::Summary(address) => Some(address),
            Binding::Registrar => None,
        }
    }

    /// True if the connection can send transactions.
    pub fn is_signer(&self) -> bool {
        self.connection.is_signer()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.connection.signer()
    }

    /// Swap the provider in place, keeping contract bindings.
    pub fn rebind(&mut self, connection: ChainConnection) {
        tracing::info!(signer = connection.is_signer(), "Blockchain client provider rebound");
        self.connection = connection;
    }

    /// Human-readable ABI of `contract` as seen by `role`.
    pub fn abi_for(&self, role: Role, contract: ContractKind) -> Vec<&'static str> {
        abi::contract_functions(role, contract)
    }

    fn summary_address(&self) -> UnisonResult<Address> {
        self.summary().ok_or_else(summary_missing)
    }

    fn signer(&self) -> UnisonResult<Address> {
        self.connection
            .signer()
            .ok_or_else(|| UnisonError::NotAuthorized("Signer not found".into()))
    }

    /// Invoke a view function and decode its return value.
    async fn read_contract<C: SolCall>(&self, to: Address, call: C) -> UnisonResult<C::Return> {
        tracing::debug!(method = C::SIGNATURE, to = %to, "Contract read");

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(call.abi_encode());
        let result = self.connection.provider().call(tx).await;
        metrics::record_contract_call("read", metrics::outcome(&result));

        let output = result.map_err(|e| {
            let parsed = parse_rpc_error(&e);
            tracing::debug!(method = C::SIGNATURE, code = %parsed.code, "Contract read failed");
            UnisonError::from(parsed)
        })?;

        C::abi_decode_returns(&output).map_err(|e| {
            UnisonError::Remote(format!("Malformed {} response: {}", C::SIGNATURE, e))
        })
    }

    /// Send a state-mutating call and wait for its confirmation.
    async fn write_contract<C: SolCall>(
        &self,
        to: Address,
        call: C,
    ) -> UnisonResult<TransactionReceipt> {
        let from = self.signer()?;
        tracing::debug!(method = C::SIGNATURE, to = %to, from = %from, "Contract write");

        let result = self.send_and_confirm(from, to, call.abi_encode()).await;
        metrics::record_contract_call("write", metrics::outcome(&result));

        let receipt = result?;
        if !receipt.status() {
            return Err(UnisonError::Remote("Transaction reverted".into()));
        }

        tracing::info!(
            method = C::SIGNATURE,
            tx_hash = %receipt.transaction_hash,
            block_number = ?receipt.block_number,
            "Transaction confirmed"
        );
        Ok(receipt)
    }

    async fn send_and_confirm(
        &self,
        from: Address,
        to: Address,
        input: Vec<u8>,
    ) -> UnisonResult<TransactionReceipt> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);

        let pending = self
            .connection
            .provider()
            .send_transaction(tx)
            .await
            .map_err(|e| UnisonError::from(parse_rpc_error(&e)))?;

        let mut pending = pending.with_required_confirmations(self.settings.confirmation_blocks);
        if let Some(secs) = self.settings.receipt_timeout_secs {
            pending = pending.with_timeout(Some(Duration::from_secs(secs)));
        }

        pending.get_receipt().await.map_err(|e| match e {
            PendingTransactionError::TransportError(e) => UnisonError::from(parse_rpc_error(&e)),
            other => UnisonError::Remote(other.to_string()),
        })
    }

    /// Run `checks` in order, stopping at the first failure.
    async fn ensure(&self, checks: &[Check<'_>]) -> UnisonResult<()> {
        for check in checks {
            if let Err(err) = self.evaluate(check).await {
                tracing::debug!(
                    check = check.name(),
                    local = check.is_local(),
                    error = %err,
                    "Pre-call check rejected"
                );
                metrics::record_guard_rejection(&err);
                return Err(err);
            }
        }
        Ok(())
    }

    async fn evaluate(&self, check: &Check<'_>) -> UnisonResult<()> {
        match *check {
            Check::Signer => self.signer().map(|_| ()),
            Check::SummaryBound => self.summary_address().map(|_| ()),
            Check::Custodian => {
                if self.is_custodian().await? {
                    Ok(())
                } else {
                    Err(UnisonError::NotAuthorized(
                        "You are not custodian of the summary contract".into(),
                    ))
                }
            }
            Check::NotEmpty { value, message } => {
                if value.is_empty() {
                    Err(UnisonError::InvalidArgument(message.into()))
                } else {
                    Ok(())
                }
            }
            Check::Address { value, label } => utils::parse_address(value, label).map(|_| ()),
            Check::InteractionInRange(id) => self.interaction_in_range(id).await.map(|_| ()),
            Check::PermissionLevel(level) => utils::permission_level(level).map(|_| ()),
            Check::Duration(duration) => utils::duration_secs(duration).map(|_| ()),
            Check::MerkleRoot(root) => utils::parse_bytes32(root).map(|_| ()),
            Check::Unregistered { value, message } => {
                if self.is_interaction_exist(value).await? {
                    Err(UnisonError::AlreadyInState(message.into()))
                } else {
                    Ok(())
                }
            }
            Check::OwnedBySummary(id) => {
                if self.is_owner_interaction(id).await? {
                    Ok(())
                } else {
                    Err(UnisonError::NotAuthorized(
                        "The interaction is not owned by summary contract".into(),
                    ))
                }
            }
            Check::ProvidedBySummary(id) => {
                if self.is_provider_interaction(id).await? {
                    Ok(())
                } else {
                    Err(UnisonError::NotAuthorized(
                        "The interaction is not provided by summary contract".into(),
                    ))
                }
            }
            Check::EnabledIs { id, enabled } => {
                let interaction = self.get_interaction(id).await?;
                match (interaction.enabled, enabled) {
                    (true, false) => Err(UnisonError::AlreadyInState(
                        "The interaction is already enabled".into(),
                    )),
                    (false, true) => Err(UnisonError::AlreadyInState(
                        "The interaction is already disabled".into(),
                    )),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Validate an interaction id against the current interactions length.
    async fn interaction_in_range(&self, interaction_id: i64) -> UnisonResult<u64> {
        let index = utils::interaction_index(interaction_id)?;
        if index >= self.get_interactions_length().await? {
            return Err(not_found());
        }
        Ok(index)
    }

    /// Resolve the summary for `reference` through the registrar and bind it.
    pub async fn connect_summary(&mut self, reference: &str) -> UnisonResult<Address> {
        let summary = self.resolve_summary(reference).await?;
        if summary == Address::ZERO {
            return Err(UnisonError::NotFound("Summary not found".into()));
        }

        tracing::info!(reference = reference, summary = %summary, "Summary contract bound");
        self.binding = Binding::Summary(summary);
        Ok(summary)
    }

    /// Human-readable reference of a summary contract.
    pub async fn resolve_reference(&self, summary_address: &str) -> UnisonResult<String> {
        let summary = utils::parse_address(summary_address, "summary")?;
        self.read_contract(
            self.registrar,
            IRegistrar::resolveReferenceCall { _summary: summary },
        )
        .await
    }

    /// Summary contract address for a reference. Zero if unknown.
    pub async fn resolve_summary(&self, reference: &str) -> UnisonResult<Address> {
        if reference.is_empty() {
            return Err(UnisonError::InvalidArgument("Reference is empty".into()));
        }
        self.read_contract(
            self.registrar,
            IRegistrar::resolveSummaryCall {
                _ref: reference.to_string(),
            },
        )
        .await
    }

    pub async fn custodian(&self) -> UnisonResult<Address> {
        let summary = self.summary_address()?;
        self.read_contract(summary, ISummary::custodianCall {}).await
    }

    /// True if the signer is the summary's custodian.
    pub async fn is_custodian(&self) -> UnisonResult<bool> {
        let signer = self.signer()?;
        self.summary_address()?;
        Ok(self.custodian().await? == signer)
    }

    /// True if the interaction is tagged Owner and its `owner()` is the summary.
    pub async fn is_owner_interaction(&self, interaction_id: i64) -> UnisonResult<bool> {
        self.is_held_by_summary(interaction_id, Role::Owner).await
    }

    /// True if the interaction is tagged Provider and its `provider()` is the summary.
    pub async fn is_provider_interaction(&self, interaction_id: i64) -> UnisonResult<bool> {
        self.is_held_by_summary(interaction_id, Role::Provider).await
    }

    async fn is_held_by_summary(&self, interaction_id: i64, role: Role) -> UnisonResult<bool> {
        let summary = self.summary_address()?;
        let interaction = self.get_interaction(interaction_id).await?;
        if interaction.role != role {
            return Ok(false);
        }

        let holder = match role {
            Role::Owner => {
                self.read_contract(interaction.interaction, IInteraction::ownerCall {})
                    .await?
            }
            Role::Provider => {
                self.read_contract(interaction.interaction, IInteraction::providerCall {})
                    .await?
            }
        };
        Ok(holder == summary)
    }

    /// True if an interaction is registered under the address or reference.
    pub async fn is_interaction_exist(&self, reference_or_address: &str) -> UnisonResult<bool> {
        let summary = self.summary_address()?;
        if reference_or_address.is_empty() {
            return Err(UnisonError::InvalidArgument(
                "reference_or_interactionAddress is empty".into(),
            ));
        }

        if utils::is_address(reference_or_address) {
            let interaction = utils::parse_address(reference_or_address, "interaction")?;
            self.read_contract(
                summary,
                ISummary::isInteractionExist_0Call {
                    _interaction: interaction,
                },
            )
            .await
        } else {
            self.read_contract(
                summary,
                ISummary::isInteractionExist_1Call {
                    _ref: reference_or_address.to_string(),
                },
            )
            .await
        }
    }

    /// Interaction id registered under the address or reference.
    pub async fn get_interaction_id(&self, reference_or_address: &str) -> UnisonResult<u64> {
        let summary = self.summary_address()?;
        if reference_or_address.is_empty() {
            return Err(UnisonError::InvalidArgument(
                "reference_or_interactionAddress is empty".into(),
            ));
        }

        let id = if utils::is_address(reference_or_address) {
            let interaction = utils::parse_address(reference_or_address, "interaction")?;
            self.read_contract(
                summary,
                ISummary::getInteractionId_1Call {
                    _interaction: interaction,
                },
            )
            .await?
        } else {
            self.read_contract(
                summary,
                ISummary::getInteractionId_0Call {
                    _ref: reference_or_address.to_string(),
                },
            )
            .await?
        };
        to_u64(id, "interaction id")
    }

    pub async fn get_interactions_length(&self) -> UnisonResult<u64> {
        let summary = self.summary_address()?;
        let length = self
            .read_contract(summary, ISummary::getInteractionsLengthCall {})
            .await?;
        to_u64(length, "interactions length")
    }

    pub async fn get_interaction(&self, interaction_id: i64) -> UnisonResult<Interaction> {
        let summary = self.summary_address()?;
        let index = self.interaction_in_range(interaction_id).await?;

        let info = self
            .read_contract(
                summary,
                ISummary::getInteractionCall {
                    _id: U256::from(index),
                },
            )
            .await?;
        Interaction::try_from(info)
    }

    pub async fn get_interactions(&self, interaction_ids: &[i64]) -> UnisonResult<Vec<Interaction>> {
        let summary = self.summary_address()?;
        if interaction_ids.is_empty() {
            return Err(UnisonError::InvalidArgument("interactionIds is empty".into()));
        }

        let mut indices = Vec::with_capacity(interaction_ids.len());
        for (i, id) in interaction_ids.iter().enumerate() {
            let index = utils::interaction_index(*id).map_err(|_| {
                UnisonError::InvalidArgument(format!("The interactionId is negative at index {}", i))
            })?;
            indices.push(index);
        }

        let length = self.get_interactions_length().await?;
        if indices.iter().any(|index| *index >= length) {
            return Err(not_found());
        }

        let infos = self
            .read_contract(
                summary,
                ISummary::getInteractionsCall {
                    _ids: indices.into_iter().map(U256::from).collect(),
                },
            )
            .await?;
        infos.into_iter().map(Interaction::try_from).collect()
    }

    /// Permission level of `entity_address` on an interaction.
    pub async fn get_viewer(&self, interaction_id: i64, entity_address: &str) -> UnisonResult<U256> {
        let summary = self.summary_address()?;
        let index = self.interaction_in_range(interaction_id).await?;
        let entity = utils::parse_address(entity_address, "entity")?;

        self.read_contract(
            summary,
            ISummary::getViewerCall {
                _id: U256::from(index),
                _entity: entity,
            },
        )
        .await
    }

    pub async fn get_data_merkle_root(&self, interaction_id: i64) -> UnisonResult<B256> {
        let summary = self.summary_address()?;
        let index = self.interaction_in_range(interaction_id).await?;

        self.read_contract(
            summary,
            ISummary::getDataMerkleRootCall {
                _id: U256::from(index),
            },
        )
        .await
    }

    /// Register an interaction contract under `reference`.
    pub async fn add_interaction(
        &self,
        reference: &str,
        interaction_address: &str,
        role: Role,
    ) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::NotEmpty {
                value: reference,
                message: "Reference is empty",
            },
            Check::Address {
                value: interaction_address,
                label: "interaction",
            },
            Check::Unregistered {
                value: interaction_address,
                message: "Interaction already exist",
            },
            Check::Unregistered {
                value: reference,
                message: "Reference already exist",
            },
        ])
        .await?;

        let summary = self.summary_address()?;
        let interaction = utils::parse_address(interaction_address, "interaction")?;
        self.write_contract(
            summary,
            ISummary::addInteractionCall {
                _ref: reference.to_string(),
                _interaction: interaction,
                _role: role.into(),
            },
        )
        .await
    }

    pub async fn enable_interaction(&self, interaction_id: i64) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::InteractionInRange(interaction_id),
            Check::OwnedBySummary(interaction_id),
            Check::EnabledIs {
                id: interaction_id,
                enabled: false,
            },
        ])
        .await?;

        let summary = self.summary_address()?;
        let index = utils::interaction_index(interaction_id)?;
        self.write_contract(
            summary,
            ISummary::enableInteractionCall {
                _id: U256::from(index),
            },
        )
        .await
    }

    pub async fn disable_interaction(&self, interaction_id: i64) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::InteractionInRange(interaction_id),
            Check::OwnedBySummary(interaction_id),
            Check::EnabledIs {
                id: interaction_id,
                enabled: true,
            },
        ])
        .await?;

        let summary = self.summary_address()?;
        let index = utils::interaction_index(interaction_id)?;
        self.write_contract(
            summary,
            ISummary::disableInteractionCall {
                _id: U256::from(index),
            },
        )
        .await
    }

    /// Grant `entity_address` a permanent permission level.
    pub async fn assign_viewer(
        &self,
        interaction_id: i64,
        entity_address: &str,
        permission_level: i64,
    ) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::InteractionInRange(interaction_id),
            Check::Address {
                value: entity_address,
                label: "entity",
            },
            Check::PermissionLevel(permission_level),
            Check::OwnedBySummary(interaction_id),
        ])
        .await?;

        let summary = self.summary_address()?;
        let call = ISummary::assignViewerCall {
            _id: U256::from(utils::interaction_index(interaction_id)?),
            _entity: utils::parse_address(entity_address, "entity")?,
            _level: utils::permission_level(permission_level)?,
        };
        self.write_contract(summary, call).await
    }

    /// Grant `entity_address` a permission level for `duration_secs` from now.
    pub async fn assign_temporary_viewer(
        &self,
        interaction_id: i64,
        entity_address: &str,
        permission_level: i64,
        duration_secs: f64,
    ) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::InteractionInRange(interaction_id),
            Check::Address {
                value: entity_address,
                label: "entity",
            },
            Check::PermissionLevel(permission_level),
            Check::Duration(duration_secs),
            Check::OwnedBySummary(interaction_id),
        ])
        .await?;

        let summary = self.summary_address()?;
        let call = temporary_viewer_call(
            utils::interaction_index(interaction_id)?,
            utils::parse_address(entity_address, "entity")?,
            utils::permission_level(permission_level)?,
            duration_secs,
            utils::unix_now(),
        )?;
        self.write_contract(summary, call).await
    }

    /// Hand the custodian role to another address.
    pub async fn set_custodian(&self, custodian_address: &str) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::Address {
                value: custodian_address,
                label: "custodian",
            },
        ])
        .await?;

        let summary = self.summary_address()?;
        let custodian = utils::parse_address(custodian_address, "custodian")?;
        self.write_contract(summary, ISummary::setCustodianCall { _custodian_: custodian })
            .await
    }

    /// Record the data merkle root of a provider interaction.
    pub async fn set_data_merkle_root(
        &self,
        interaction_id: i64,
        merkle_root: &str,
    ) -> UnisonResult<TransactionReceipt> {
        self.ensure(&[
            Check::Signer,
            Check::SummaryBound,
            Check::Custodian,
            Check::InteractionInRange(interaction_id),
            Check::MerkleRoot(merkle_root),
            Check::ProvidedBySummary(interaction_id),
        ])
        .await?;

        let summary = self.summary_address()?;
        let call = ISummary::setDataMerkleRootCall {
            _id: U256::from(utils::interaction_index(interaction_id)?),
            _merkleRoot: utils::parse_bytes32(merkle_root)?,
        };
        self.write_contract(summary, call).await
    }
}

impl std::fmt::Debug for UnisonBlockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnisonBlockchain")
            .field("chain_id", &self.chain_id.0)
            .field("registrar", &self.registrar)
            .field("summary", &self.summary())
            .field("signer", &self.connection.signer())
            .finish()
    }
}
