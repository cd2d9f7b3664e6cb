//! Contract interfaces and role-filtered ABI sets.
//!
//! The three interfaces are declared once with `sol!`; [`Method`] enumerates
//! every function so role filtering is a set operation over an enum rather
//! than a match on signature text.

use alloy::primitives::Selector;
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::types::Role;

sol! {
    /// Directory from human-readable references to summary contracts.
    interface IRegistrar {
        function resolveReference(address _summary) external view returns (string memory);
        function resolveSummary(string _ref) external view returns (address);
    }

    /// Ledger of interactions, viewers and merkle roots.
    interface ISummary {
        #[derive(Debug, PartialEq, Eq)]
        struct InteractionInfo {
            address interaction;
            bool enable;
            uint8 role;
        }

        function addInteraction(string _ref, address _interaction, uint8 _role) external;
        function assignTemporaryViewer(uint256 _id, address _entity, uint256 _level, uint256 _deadline) external;
        function assignViewer(uint256 _id, address _entity, uint256 _level) external;
        function custodian() external view returns (address);
        function disableInteraction(uint256 _id) external;
        function enableInteraction(uint256 _id) external;
        function getDataMerkleRoot(uint256 _id) external view returns (bytes32);
        function getInteraction(uint256 _id) external view returns (InteractionInfo memory interaction);
        function getInteractionId(string _ref) external view returns (uint256);
        function getInteractionId(address _interaction) external view returns (uint256);
        function getInteractions(uint256[] _ids) external view returns (InteractionInfo[] memory interactions);
        function getInteractionsLength() external view returns (uint256);
        function getViewer(uint256 _id, address _entity) external view returns (uint256);
        function isInteractionExist(address _interaction) external view returns (bool);
        function isInteractionExist(string _ref) external view returns (bool);
        function setCustodian(address _custodian_) external;
        function setDataMerkleRoot(uint256 _id, bytes32 _merkleRoot) external;
    }

    /// A party contract registered in a summary.
    interface IInteraction {
        function owner() external view returns (address);
        function provider() external view returns (address);
    }
}

/// The contracts the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Registrar,
    Summary,
    Interaction,
}

/// Every contract function the SDK knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    ResolveReference,
    ResolveSummary,
    AddInteraction,
    AssignTemporaryViewer,
    AssignViewer,
    Custodian,
    DisableInteraction,
    EnableInteraction,
    GetDataMerkleRoot,
    GetInteraction,
    GetInteractionIdByReference,
    GetInteractionIdByAddress,
    GetInteractions,
    GetInteractionsLength,
    GetViewer,
    IsInteractionExistByAddress,
    IsInteractionExistByReference,
    SetCustodian,
    SetDataMerkleRoot,
    Owner,
    Provider,
}

impl Method {
    /// All methods, grouped by contract in declaration order.
    pub const ALL: [Method; 21] = [
        Method::ResolveReference,
        Method::ResolveSummary,
        Method::AddInteraction,
        Method::AssignTemporaryViewer,
        Method::AssignViewer,
        Method::Custodian,
        Method::DisableInteraction,
        Method::EnableInteraction,
        Method::GetDataMerkleRoot,
        Method::GetInteraction,
        Method::GetInteractionIdByReference,
        Method::GetInteractionIdByAddress,
        Method::GetInteractions,
        Method::GetInteractionsLength,
        Method::GetViewer,
        Method::IsInteractionExistByAddress,
        Method::IsInteractionExistByReference,
        Method::SetCustodian,
        Method::SetDataMerkleRoot,
        Method::Owner,
        Method::Provider,
    ];

    pub const fn contract(self) -> ContractKind {
        match self {
            Method::ResolveReference | Method::ResolveSummary => ContractKind::Registrar,
            Method::Owner | Method::Provider => ContractKind::Interaction,
            _ => ContractKind::Summary,
        }
    }

    /// Human-readable ABI line.
    pub const fn signature(self) -> &'static str {
        match self {
            Method::ResolveReference => "function resolveReference(address _summary) view returns (string)",
            Method::ResolveSummary => "function resolveSummary(string _ref) view returns (address)",
            Method::AddInteraction => "function addInteraction(string _ref, address _interaction, uint8 _role)",
            Method::AssignTemporaryViewer => "function assignTemporaryViewer(uint256 _id, address _entity, uint256 _level, uint256 _deadline)",
            Method::AssignViewer => "function assignViewer(uint256 _id, address _entity, uint256 _level)",
            Method::Custodian => "function custodian() view returns (address)",
            Method::DisableInteraction => "function disableInteraction(uint256 _id)",
            Method::EnableInteraction => "function enableInteraction(uint256 _id)",
            Method::GetDataMerkleRoot => "function getDataMerkleRoot(uint256 _id) view returns (bytes32)",
            Method::GetInteraction => "function getInteraction(uint256 _id) view returns (tuple(address interaction, bool enable, uint8 role) interaction)",
            Method::GetInteractionIdByReference => "function getInteractionId(string _ref) view returns (uint256)",
            Method::GetInteractionIdByAddress => "function getInteractionId(address _interaction) view returns (uint256)",
            Method::GetInteractions => "function getInteractions(uint256[] _ids) view returns (tuple(address interaction, bool enable, uint8 role)[] interactions)",
            Method::GetInteractionsLength => "function getInteractionsLength() view returns (uint256)",
            Method::GetViewer => "function getViewer(uint256 _id, address _entity) view returns (uint256)",
            Method::IsInteractionExistByAddress => "function isInteractionExist(address _interaction) view returns (bool)",
            Method::IsInteractionExistByReference => "function isInteractionExist(string _ref) view returns (bool)",
            Method::SetCustodian => "function setCustodian(address _custodian_)",
            Method::SetDataMerkleRoot => "function setDataMerkleRoot(uint256 _id, bytes32 _merkleRoot)",
            Method::Owner => "function owner() view returns (address)",
            Method::Provider => "function provider() view returns (address)",
        }
    }

    /// Canonical signature, e.g. `getViewer(uint256,address)`.
    pub fn canonical(self) -> &'static str {
        match self {
            Method::ResolveReference => IRegistrar::resolveReferenceCall::SIGNATURE,
            Method::ResolveSummary => IRegistrar::resolveSummaryCall::SIGNATURE,
            Method::AddInteraction => ISummary::addInteractionCall::SIGNATURE,
            Method::AssignTemporaryViewer => ISummary::assignTemporaryViewerCall::SIGNATURE,
            Method::AssignViewer => ISummary::assignViewerCall::SIGNATURE,
            Method::Custodian => ISummary::custodianCall::SIGNATURE,
            Method::DisableInteraction => ISummary::disableInteractionCall::SIGNATURE,
            Method::EnableInteraction => ISummary::enableInteractionCall::SIGNATURE,
            Method::GetDataMerkleRoot => ISummary::getDataMerkleRootCall::SIGNATURE,
            Method::GetInteraction => ISummary::getInteractionCall::SIGNATURE,
            Method::GetInteractionIdByReference => ISummary::getInteractionId_0Call::SIGNATURE,
            Method::GetInteractionIdByAddress => ISummary::getInteractionId_1Call::SIGNATURE,
            Method::GetInteractions => ISummary::getInteractionsCall::SIGNATURE,
            Method::GetInteractionsLength => ISummary::getInteractionsLengthCall::SIGNATURE,
            Method::GetViewer => ISummary::getViewerCall::SIGNATURE,
            Method::IsInteractionExistByAddress => ISummary::isInteractionExist_0Call::SIGNATURE,
            Method::IsInteractionExistByReference => ISummary::isInteractionExist_1Call::SIGNATURE,
            Method::SetCustodian => ISummary::setCustodianCall::SIGNATURE,
            Method::SetDataMerkleRoot => ISummary::setDataMerkleRootCall::SIGNATURE,
            Method::Owner => IInteraction::ownerCall::SIGNATURE,
            Method::Provider => IInteraction::providerCall::SIGNATURE,
        }
    }

    /// Four-byte function selector.
    pub fn selector(self) -> Selector {
        let raw = match self {
            Method::ResolveReference => IRegistrar::resolveReferenceCall::SELECTOR,
            Method::ResolveSummary => IRegistrar::resolveSummaryCall::SELECTOR,
            Method::AddInteraction => ISummary::addInteractionCall::SELECTOR,
            Method::AssignTemporaryViewer => ISummary::assignTemporaryViewerCall::SELECTOR,
            Method::AssignViewer => ISummary::assignViewerCall::SELECTOR,
            Method::Custodian => ISummary::custodianCall::SELECTOR,
            Method::DisableInteraction => ISummary::disableInteractionCall::SELECTOR,
            Method::EnableInteraction => ISummary::enableInteractionCall::SELECTOR,
            Method::GetDataMerkleRoot => ISummary::getDataMerkleRootCall::SELECTOR,
            Method::GetInteraction => ISummary::getInteractionCall::SELECTOR,
            Method::GetInteractionIdByReference => ISummary::getInteractionId_0Call::SELECTOR,
            Method::GetInteractionIdByAddress => ISummary::getInteractionId_1Call::SELECTOR,
            Method::GetInteractions => ISummary::getInteractionsCall::SELECTOR,
            Method::GetInteractionsLength => ISummary::getInteractionsLengthCall::SELECTOR,
            Method::GetViewer => ISummary::getViewerCall::SELECTOR,
            Method::IsInteractionExistByAddress => ISummary::isInteractionExist_0Call::SELECTOR,
            Method::IsInteractionExistByReference => ISummary::isInteractionExist_1Call::SELECTOR,
            Method::SetCustodian => ISummary::setCustodianCall::SELECTOR,
            Method::SetDataMerkleRoot => ISummary::setDataMerkleRootCall::SELECTOR,
            Method::Owner => IInteraction::ownerCall::SELECTOR,
            Method::Provider => IInteraction::providerCall::SELECTOR,
        };
        Selector::from(raw)
    }
}

/// Full method set of a contract.
pub fn abi(contract: ContractKind) -> Vec<Method> {
    Method::ALL
        .into_iter()
        .filter(|m| m.contract() == contract)
        .collect()
}

impl Role {
    /// The one Summary method reserved for the opposing role.
    pub const fn excluded(self) -> Method {
        match self {
            Role::Owner => Method::AssignTemporaryViewer,
            Role::Provider => Method::AssignViewer,
        }
    }

    pub fn permits(self, method: Method) -> bool {
        method != self.excluded()
    }
}

/// Method set of a contract as seen by `role`.
pub fn role_abi(role: Role, contract: ContractKind) -> Vec<Method> {
    abi(contract)
        .into_iter()
        .filter(|m| role.permits(*m))
        .collect()
}

/// Human-readable ABI lines of a contract as seen by `role`.
pub fn contract_functions(role: Role, contract: ContractKind) -> Vec<&'static str> {
    role_abi(role, contract)
        .into_iter()
        .map(Method::signature)
        .collect()
}
