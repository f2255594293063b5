//! Carbon-credit ledger for the storefront's rewards program.
//!
//! The ledger is an explicit object owned by its caller and backed by a [`KeyValueStore`].
//! Every successful mutation is written through to the store under the `user`,
//! `carbonCredits`, and `redeemedRewards` keys.

pub mod router;
pub mod store;

pub use router::{ledger_router, SharedLedger};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const USER_KEY: &str = "user";
pub const CREDITS_KEY: &str = "carbonCredits";
pub const REWARDS_KEY: &str = "redeemedRewards";

pub const DEMO_STARTING_CREDITS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub carbon_credits: u64,
}

impl UserProfile {
    pub fn demo() -> Self {
        Self {
            id: "demo-user".to_string(),
            email: "demo@ecomart.com".to_string(),
            full_name: "Demo User".to_string(),
            carbon_credits: DEMO_STARTING_CREDITS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemedReward {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("credit amount must be greater than zero")]
    InvalidAmount,
    #[error("insufficient carbon credits: requested {requested}, available {available}")]
    InsufficientCredits { requested: u64, available: u64 },
    #[error("credit balance would overflow")]
    BalanceOverflow,
    #[error("reward must carry a non-empty id")]
    InvalidReward,
    #[error("login requires both an email and a name")]
    InvalidLogin,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Serializable view of the ledger for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub user: Option<UserProfile>,
    pub carbon_credits: u64,
    pub redeemed_rewards: Vec<RedeemedReward>,
    pub is_logged_in: bool,
}

pub struct CreditLedger<S> {
    store: Arc<S>,
    user: Option<UserProfile>,
    credits: u64,
    rewards: Vec<RedeemedReward>,
}

impl<S> CreditLedger<S>
where
    S: KeyValueStore,
{
    /// Hydrates from the store, seeding the demo user when none is saved.
    pub fn load(store: Arc<S>) -> Result<Self, LedgerError> {
        let mut credits = DEMO_STARTING_CREDITS;
        let mut user = None;

        match store.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(saved) => {
                    if saved.carbon_credits != 0 {
                        credits = saved.carbon_credits;
                    }
                    user = Some(saved);
                }
                Err(error) => {
                    warn!(%error, "discarding unreadable saved user");
                    store.remove(USER_KEY)?;
                }
            },
            None => {
                let demo = UserProfile::demo();
                store.set(USER_KEY, encode(&demo)?)?;
                user = Some(demo);
            }
        }

        if let Some(raw) = store.get(CREDITS_KEY)? {
            match raw.trim().parse::<u64>() {
                Ok(saved) => credits = saved,
                Err(error) => warn!(%error, value = %raw, "ignoring unreadable saved credits"),
            }
        }

        let rewards: Vec<RedeemedReward> = match store.get(REWARDS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                warn!(%error, "discarding unreadable saved rewards");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let ledger = Self {
            store,
            user,
            credits,
            rewards,
        };
        ledger.persist()?;
        Ok(ledger)
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn credits(&self) -> u64 {
        self.credits
    }

    pub fn redeemed_rewards(&self) -> &[RedeemedReward] {
        &self.rewards
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            user: self.user.clone().map(|mut user| {
                user.carbon_credits = self.credits;
                user
            }),
            carbon_credits: self.credits,
            redeemed_rewards: self.rewards.clone(),
            is_logged_in: self.is_logged_in(),
        }
    }

    /// Returns the new balance.
    pub fn add_credits(&mut self, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self
            .credits
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.commit(balance, None)?;
        info!(amount, balance, "carbon credits added");
        Ok(balance)
    }

    /// Returns the new balance; the balance is untouched when it cannot cover `amount`.
    pub fn spend_credits(&mut self, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self.debit(amount)?;
        self.commit(balance, None)?;
        info!(amount, balance, "carbon credits spent");
        Ok(balance)
    }

    pub fn record_reward(&mut self, reward: RedeemedReward) -> Result<(), LedgerError> {
        if reward.id.trim().is_empty() {
            return Err(LedgerError::InvalidReward);
        }
        self.commit(self.credits, Some(reward))
    }

    /// Spends the reward's cost and records it in one step. Free rewards only get recorded.
    pub fn redeem(&mut self, mut reward: RedeemedReward) -> Result<u64, LedgerError> {
        if reward.id.trim().is_empty() {
            return Err(LedgerError::InvalidReward);
        }
        let balance = self.debit(reward.cost)?;
        reward.redeemed_at.get_or_insert_with(Utc::now);
        let (reward_id, cost) = (reward.id.clone(), reward.cost);
        self.commit(balance, Some(reward))?;
        info!(reward_id = %reward_id, cost, balance, "reward redeemed");
        Ok(balance)
    }

    /// Replaces the current user, keeping the running balance.
    pub fn login(&mut self, email: &str, full_name: &str) -> Result<UserProfile, LedgerError> {
        let email = email.trim();
        let full_name = full_name.trim();
        if email.is_empty() || full_name.is_empty() {
            return Err(LedgerError::InvalidLogin);
        }
        let user = UserProfile {
            id: Utc::now().timestamp_millis().to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            carbon_credits: self.credits,
        };
        info!(user_id = %user.id, "ledger user logged in");
        self.write(Some(&user), self.credits, &self.rewards)?;
        self.user = Some(user.clone());
        Ok(user)
    }

    /// Resets saved state to the demo user with the starting balance and no rewards.
    pub fn logout(&mut self) -> Result<(), LedgerError> {
        let demo = UserProfile::demo();
        self.write(Some(&demo), DEMO_STARTING_CREDITS, &[])?;
        self.user = Some(demo);
        self.credits = DEMO_STARTING_CREDITS;
        self.rewards.clear();
        info!("ledger reset to demo user");
        Ok(())
    }

    fn debit(&self, amount: u64) -> Result<u64, LedgerError> {
        self.credits
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientCredits {
                requested: amount,
                available: self.credits,
            })
    }

    /// Writes first so a failed store leaves both memory and the store unchanged.
    fn commit(&mut self, balance: u64, reward: Option<RedeemedReward>) -> Result<(), LedgerError> {
        let mut rewards = self.rewards.clone();
        rewards.extend(reward);
        self.write(self.user.as_ref(), balance, &rewards)?;
        self.credits = balance;
        self.rewards = rewards;
        Ok(())
    }

    fn persist(&self) -> Result<(), LedgerError> {
        self.write(self.user.as_ref(), self.credits, &self.rewards)
    }

    fn write(
        &self,
        user: Option<&UserProfile>,
        credits: u64,
        rewards: &[RedeemedReward],
    ) -> Result<(), LedgerError> {
        let Some(user) = user else {
            return Ok(());
        };
        let mut saved = user.clone();
        saved.carbon_credits = credits;
        self.store.set_many(vec![
            (USER_KEY, encode(&saved)?),
            (CREDITS_KEY, credits.to_string()),
            (REWARDS_KEY, encode(rewards)?),
        ])?;
        Ok(())
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(store: &MemoryStore) -> CreditLedger<MemoryStore> {
        CreditLedger::load(Arc::new(store.clone())).expect("ledger loads")
    }

    fn reward(id: &str, cost: u64) -> RedeemedReward {
        RedeemedReward {
            id: id.to_string(),
            title: format!("Reward {id}"),
            cost,
            redeemed_at: None,
        }
    }

    #[test]
    fn empty_store_seeds_demo_user() {
        let store = MemoryStore::new();
        let ledger = ledger_with(&store);
        assert_eq!(ledger.credits(), DEMO_STARTING_CREDITS);
        assert_eq!(ledger.user(), Some(&UserProfile::demo()));
        let saved: UserProfile =
            serde_json::from_str(&store.get(USER_KEY).expect("get").expect("user saved"))
                .expect("user json");
        assert_eq!(saved.id, "demo-user");
        assert_eq!(store.get(CREDITS_KEY).expect("get"), Some("250".to_string()));
    }

    #[test]
    fn saved_credits_override_user_balance() {
        let store = MemoryStore::new();
        let mut user = UserProfile::demo();
        user.carbon_credits = 90;
        store
            .set(USER_KEY, serde_json::to_string(&user).expect("encode"))
            .expect("set");
        store.set(CREDITS_KEY, "75".to_string()).expect("set");
        assert_eq!(ledger_with(&store).credits(), 75);

        store.set(CREDITS_KEY, "lots".to_string()).expect("set");
        assert_eq!(ledger_with(&store).credits(), 90);
    }

    #[test]
    fn zero_user_balance_keeps_starting_credits() {
        let store = MemoryStore::new();
        let mut user = UserProfile::demo();
        user.carbon_credits = 0;
        store
            .set(USER_KEY, serde_json::to_string(&user).expect("encode"))
            .expect("set");
        assert_eq!(ledger_with(&store).credits(), DEMO_STARTING_CREDITS);
    }

    #[test]
    fn corrupt_user_is_discarded() {
        let store = MemoryStore::new();
        store.set(USER_KEY, "{not json".to_string()).expect("set");
        store.set(REWARDS_KEY, "nope".to_string()).expect("set");
        let ledger = ledger_with(&store);
        assert!(!ledger.is_logged_in());
        assert!(ledger.redeemed_rewards().is_empty());
        assert_eq!(store.get(USER_KEY).expect("get"), None);
    }

    #[test]
    fn add_and_spend_update_balance_and_store() {
        let store = MemoryStore::new();
        let mut ledger = ledger_with(&store);
        assert_eq!(ledger.add_credits(50).expect("add"), 300);
        assert_eq!(ledger.spend_credits(120).expect("spend"), 180);
        assert_eq!(store.get(CREDITS_KEY).expect("get"), Some("180".to_string()));
        assert_eq!(ledger.snapshot().user.expect("user").carbon_credits, 180);
    }

    #[test]
    fn overspend_is_rejected_without_change() {
        let store = MemoryStore::new();
        let mut ledger = ledger_with(&store);
        match ledger.spend_credits(251) {
            Err(LedgerError::InsufficientCredits {
                requested,
                available,
            }) => {
                assert_eq!(requested, 251);
                assert_eq!(available, 250);
            }
            other => panic!("expected insufficient credits, got {other:?}"),
        }
        assert_eq!(ledger.credits(), 250);
        assert_eq!(ledger.spend_credits(250).expect("exact spend"), 0);
    }

    #[test]
    fn zero_amounts_are_invalid() {
        let store = MemoryStore::new();
        let mut ledger = ledger_with(&store);
        assert!(matches!(ledger.add_credits(0), Err(LedgerError::InvalidAmount)));
        assert!(matches!(ledger.spend_credits(0), Err(LedgerError::InvalidAmount)));
    }

    #[test]
    fn redeem_spends_and_records() {
        let store = MemoryStore::new();
        let mut ledger = ledger_with(&store);
        assert_eq!(ledger.redeem(reward("tote-bag", 100)).expect("redeem"), 150);
        let recorded = &ledger.redeemed_rewards()[0];
        assert_eq!(recorded.id, "tote-bag");
        assert!(recorded.redeemed_at.is_some());

        assert!(matches!(
            ledger.redeem(reward("bike", 500)),
            Err(LedgerError::InsufficientCredits { .. })
        ));
        assert_eq!(ledger.redeemed_rewards().len(), 1);
        assert_eq!(ledger.credits(), 150);

        let reloaded = ledger_with(&store);
        assert_eq!(reloaded.redeemed_rewards().len(), 1);
        assert_eq!(reloaded.credits(), 150);
    }

    #[test]
    fn record_reward_requires_id() {
        let store = MemoryStore::new();
        let mut ledger = ledger_with(&store);
        assert!(matches!(
            ledger.record_reward(reward(" ", 10)),
            Err(LedgerError::InvalidReward)
        ));
        ledger.record_reward(reward("seed-kit", 10)).expect("record");
        assert_eq!(ledger.credits(), 250);
        assert_eq!(ledger.redeemed_rewards().len(), 1);
    }

    #[test]
    fn login_keeps_balance_and_logout_resets() {
        let store = MemoryStore::new();
        let mut ledger = ledger_with(&store);
        ledger.spend_credits(40).expect("spend");
        let user = ledger.login("ada@example.com", "Ada").expect("login");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.carbon_credits, 210);
        assert_ne!(user.id, "demo-user");
        assert!(matches!(ledger.login("", "Ada"), Err(LedgerError::InvalidLogin)));

        ledger.redeem(reward("mug", 10)).expect("redeem");
        ledger.logout().expect("logout");
        assert_eq!(ledger.user(), Some(&UserProfile::demo()));
        assert_eq!(ledger.credits(), DEMO_STARTING_CREDITS);
        assert!(ledger.redeemed_rewards().is_empty());
        assert_eq!(store.get(REWARDS_KEY).expect("get"), Some("[]".to_string()));
    }

    /// Refuses every batch that touches the rewards key once armed.
    struct RewardsDiskFull {
        inner: MemoryStore,
        armed: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for RewardsDiskFull {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }

        fn set_many(&self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
            let armed = self.armed.load(std::sync::atomic::Ordering::SeqCst);
            if armed && entries.iter().any(|(key, _)| *key == REWARDS_KEY) {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.set_many(entries)
        }
    }

    #[test]
    fn failed_redeem_leaves_saved_state_untouched() {
        let store = Arc::new(RewardsDiskFull {
            inner: MemoryStore::new(),
            armed: std::sync::atomic::AtomicBool::new(false),
        });
        let mut ledger = CreditLedger::load(store.clone()).expect("ledger loads");
        store.armed.store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(matches!(
            ledger.redeem(reward("tote-bag", 100)),
            Err(LedgerError::Store(_))
        ));
        assert_eq!(ledger.credits(), 250);
        assert_eq!(store.inner.get(CREDITS_KEY).expect("get"), Some("250".to_string()));

        store.armed.store(false, std::sync::atomic::Ordering::SeqCst);
        let reloaded = CreditLedger::load(store).expect("reload");
        assert_eq!(reloaded.credits(), 250);
        assert!(reloaded.redeemed_rewards().is_empty());
    }
}
