use alloy_primitives::{map::HashMap, Address, Bytes, B256, U256};
use delegate::delegate;

use super::MockContract;
use crate::{
    calculate_create_address, BlockEnvironment, BlockSnapshot, CallDispatcher, CallRequest,
    DeployOutcome, DeployRequest, DispatchError, DispatchOutcome,
};

/// Gas charged for a contract creation.
pub const CREATE_GAS: u64 = 32_000;

/// Accounts of a [`MemoryChain`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ChainState {
    /// Native balances.
    pub balances: HashMap<Address, U256>,
    /// Account nonces.
    pub nonces: HashMap<Address, u64>,
    /// Hosted contracts.
    pub contracts: HashMap<Address, MockContract>,
}

/// An in-memory host for testing purposes.
///
/// Contracts are [`MockContract`]s. Value transfers move native balance from the caller to the
/// target and revert the call if the caller cannot cover them. Every dispatched request is
/// recorded, including requests whose effects were later reverted.
#[derive(Debug, Clone, Default, derive_more::Deref, derive_more::DerefMut)]
pub struct MemoryChain {
    #[deref]
    #[deref_mut]
    env: BlockSnapshot,
    state: ChainState,
    checkpoints: Vec<ChainState>,
    deployables: HashMap<Bytes, MockContract>,
    dispatched: Vec<CallRequest>,
}

impl MemoryChain {
    /// Creates a chain at `env` with no accounts.
    pub fn new(env: BlockSnapshot) -> Self {
        Self { env, ..Default::default() }
    }

    /// Creates a chain at `env` with `state`.
    pub fn from_state(env: BlockSnapshot, state: ChainState) -> Self {
        Self { env, state, ..Default::default() }
    }

    /// The account state.
    pub const fn state(&self) -> &ChainState {
        &self.state
    }

    /// Hosts `contract` at `address`.
    pub fn set_contract(&mut self, address: Address, contract: MockContract) {
        self.state.contracts.insert(address, contract);
    }

    /// Hosts `contract` at `address`.
    pub fn contract(mut self, address: Address, contract: MockContract) -> Self {
        self.set_contract(address, contract);
        self
    }

    /// Sets the native balance of `address`.
    pub fn set_account_balance(&mut self, address: Address, balance: U256) {
        self.state.balances.insert(address, balance);
    }

    /// Sets the native balance of `address`.
    pub fn account_balance(mut self, address: Address, balance: U256) -> Self {
        self.set_account_balance(address, balance);
        self
    }

    /// Sets the nonce of `address`.
    pub fn set_account_nonce(&mut self, address: Address, nonce: u64) {
        self.state.nonces.insert(address, nonce);
    }

    /// Sets the nonce of `address`.
    pub fn account_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.set_account_nonce(address, nonce);
        self
    }

    /// Makes `init_code` deploy `contract`. Unregistered init code fails to deploy.
    pub fn set_deployable(&mut self, init_code: Bytes, contract: MockContract) {
        self.deployables.insert(init_code, contract);
    }

    /// Makes `init_code` deploy `contract`.
    pub fn deployable(mut self, init_code: Bytes, contract: MockContract) -> Self {
        self.set_deployable(init_code, contract);
        self
    }

    /// The native balance of `address`.
    pub fn balance_of(&self, address: Address) -> U256 {
        self.state.balances.get(&address).copied().unwrap_or_default()
    }

    /// The nonce of `address`.
    pub fn nonce_of(&self, address: Address) -> u64 {
        self.state.nonces.get(&address).copied().unwrap_or_default()
    }

    /// The contract hosted at `address`.
    pub fn contract_at(&self, address: Address) -> Option<&MockContract> {
        self.state.contracts.get(&address)
    }

    /// Every request dispatched so far.
    pub fn dispatched(&self) -> &[CallRequest] {
        &self.dispatched
    }

    /// Number of requests dispatched so far.
    pub fn dispatch_count(&self) -> usize {
        self.dispatched.len()
    }

    /// Moves `value` from `from` to `to`. Returns `false` without changes if `from` cannot
    /// cover it.
    fn transfer(&mut self, from: Address, to: Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }
        let Some(remaining) = self.balance_of(from).checked_sub(value) else {
            return false;
        };
        self.state.balances.insert(from, remaining);
        let credited = self.balance_of(to).saturating_add(value);
        self.state.balances.insert(to, credited);
        true
    }
}

impl CallDispatcher for MemoryChain {
    fn dispatch(&mut self, request: CallRequest) -> Result<DispatchOutcome, DispatchError> {
        self.dispatched.push(request.clone());

        let Some(mut contract) = self.state.contracts.get(&request.target).cloned() else {
            return Ok(DispatchOutcome::unreachable());
        };

        let snapshot = self.state.clone();
        if !self.transfer(request.caller, request.target, request.value) {
            return Ok(DispatchOutcome::revert(0, Bytes::new()));
        }
        let outcome = contract.call(&request, |address| self.balance_of(address));
        if outcome.is_success() {
            self.state.contracts.insert(request.target, contract);
        } else {
            self.state = snapshot;
        }
        Ok(outcome)
    }

    fn deploy(&mut self, request: DeployRequest) -> Result<DeployOutcome, DispatchError> {
        let failed = |gas_used| DeployOutcome { address: None, gas_used, output: Bytes::new() };
        if request.gas_limit < CREATE_GAS {
            return Ok(failed(request.gas_limit));
        }
        let Some(contract) = self.deployables.get(&request.init_code).cloned() else {
            return Ok(failed(CREATE_GAS));
        };

        let nonce = self.nonce_of(request.deployer);
        let address = calculate_create_address(request.deployer, nonce);
        if self.state.contracts.contains_key(&address) {
            return Err(DispatchError::State(format!("address collision at {address}")));
        }
        self.set_account_nonce(request.deployer, nonce + 1);
        if !self.transfer(request.deployer, address, request.value) {
            return Ok(failed(CREATE_GAS));
        }
        self.set_contract(address, contract);
        Ok(DeployOutcome { address: Some(address), gas_used: CREATE_GAS, output: Bytes::new() })
    }

    fn checkpoint(&mut self) -> usize {
        self.checkpoints.push(self.state.clone());
        self.checkpoints.len() - 1
    }

    fn revert_to(&mut self, checkpoint: usize) {
        if let Some(state) = self.checkpoints.get(checkpoint).cloned() {
            self.state = state;
            self.checkpoints.truncate(checkpoint);
        }
    }

    fn commit(&mut self, checkpoint: usize) {
        self.checkpoints.truncate(checkpoint);
    }
}

impl BlockEnvironment for MemoryChain {
    delegate! {
        to self.env {
            fn block_number(&self) -> u64;
            fn block_hash(&self, number: u64) -> Option<B256>;
            fn timestamp(&self) -> u64;
            fn coinbase(&self) -> Address;
            fn difficulty(&self) -> U256;
            fn gas_limit(&self) -> u64;
            fn basefee(&self) -> u64;
            fn chain_id(&self) -> u64;
        }
    }

    fn balance(&self, address: Address) -> Option<U256> {
        Some(self.balance_of(address))
    }
}
