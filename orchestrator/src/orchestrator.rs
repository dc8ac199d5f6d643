//! The flow orchestrator proper.

use crate::error::FlowError;
use crate::notifier::Notifier;
use praman_challenge::{ChallengeError, ChallengeStore};
use praman_registry::{NewEntity, NewIdentity, Registry, RegistryStore};
use praman_store::{EntityRecord, ProfileRecord, TaxRecord};
use praman_types::{ChannelKey, ChannelType, CoreParams, IdentityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What a flow will commit once its channel is verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    Identity,
    TaxIdentifier,
    Entity,
}

/// Lifecycle of a flow. There is no transition out of `Failed`; a fresh
/// `start_flow` replaces the record instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowPhase {
    ChallengeSent,
    Verified,
    Committed,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct FlowState {
    flow_type: FlowType,
    phase: FlowPhase,
    reference: String,
    attempts: u32,
    started_at: Timestamp,
}

/// Events emitted by the orchestrator for the daemon to process.
#[derive(Clone, Debug)]
pub enum FlowEvent {
    ChallengeIssued {
        channel: ChannelKey,
        flow_type: FlowType,
        reference: String,
    },
    ChannelVerified {
        channel: ChannelKey,
        flow_type: FlowType,
    },
    FlowCommitted {
        channel: ChannelKey,
        flow_type: FlowType,
        /// The identifier minted by the commit.
        issued: String,
    },
    FlowFailed {
        channel: ChannelKey,
        flow_type: FlowType,
        reason: String,
    },
}

/// Returned from `start_flow`. `code` is populated only when
/// `CoreParams::dev_reveal_codes` is set.
#[derive(Clone, Debug, Serialize)]
pub struct StartedFlow {
    pub reference: String,
    pub expires_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Serializable snapshot of all in-flight flows.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FlowSnapshot {
    flows: HashMap<ChannelKey, FlowState>,
}

/// Drives issuance flows end to end: challenge out, code in, commit.
///
/// Flows are keyed by contact channel; starting a new flow for a channel
/// replaces whatever flow was there, mirroring challenge reissue.
pub struct FlowOrchestrator<S> {
    registry: Arc<Registry<S>>,
    challenges: Arc<ChallengeStore>,
    notifier: Arc<dyn Notifier>,
    flows: Mutex<HashMap<ChannelKey, FlowState>>,
    pending_events: Mutex<Vec<FlowEvent>>,
    max_attempts: u32,
    reveal_codes: bool,
}

impl<S: RegistryStore> FlowOrchestrator<S> {
    pub fn new(
        registry: Arc<Registry<S>>,
        challenges: Arc<ChallengeStore>,
        notifier: Arc<dyn Notifier>,
        params: &CoreParams,
    ) -> Self {
        Self {
            registry,
            challenges,
            notifier,
            flows: Mutex::new(HashMap::new()),
            pending_events: Mutex::new(Vec::new()),
            max_attempts: params.max_verify_attempts,
            reveal_codes: params.dev_reveal_codes,
        }
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    /// Start (or restart) a flow: issue a challenge and hand the code to
    /// the notifier.
    pub fn start_flow(&self, flow_type: FlowType, channel: &ChannelKey, now: Timestamp) -> StartedFlow {
        let issued = self.challenges.issue(channel, now);
        self.flows.lock().unwrap().insert(
            channel.clone(),
            FlowState {
                flow_type,
                phase: FlowPhase::ChallengeSent,
                reference: issued.reference.clone(),
                attempts: 0,
                started_at: now,
            },
        );
        self.notifier
            .deliver_code(channel, &issued.code, &issued.reference);
        self.push_event(FlowEvent::ChallengeIssued {
            channel: channel.clone(),
            flow_type,
            reference: issued.reference.clone(),
        });
        StartedFlow {
            reference: issued.reference,
            expires_at: issued.expires_at,
            code: self.reveal_codes.then_some(issued.code),
        }
    }

    /// Submit a challenge code for a flow.
    ///
    /// Attempts are counted per flow; exhausting them fails the flow and
    /// only a fresh `start_flow` can recover the channel.
    pub fn submit_code(
        &self,
        channel: &ChannelKey,
        code: &str,
        now: Timestamp,
    ) -> Result<(), FlowError> {
        let mut flows = self.flows.lock().unwrap();
        let state = flows.get_mut(channel).ok_or(FlowError::NoActiveFlow)?;
        match state.phase {
            FlowPhase::ChallengeSent => {}
            FlowPhase::Failed => return Err(FlowError::TooManyAttempts),
            FlowPhase::Verified | FlowPhase::Committed => {
                return Err(FlowError::Challenge(ChallengeError::AlreadyConsumed));
            }
        }

        state.attempts += 1;
        match self.challenges.verify(channel, code, now) {
            Ok(()) => {
                state.phase = FlowPhase::Verified;
                self.push_event(FlowEvent::ChannelVerified {
                    channel: channel.clone(),
                    flow_type: state.flow_type,
                });
                Ok(())
            }
            Err(err) => {
                if state.attempts >= self.max_attempts {
                    state.phase = FlowPhase::Failed;
                    self.push_event(FlowEvent::FlowFailed {
                        channel: channel.clone(),
                        flow_type: state.flow_type,
                        reason: "verification attempts exhausted".into(),
                    });
                }
                Err(FlowError::Challenge(err))
            }
        }
    }

    /// Commit an identity flow. The registry spends the verified
    /// challenge; any commit failure fails the flow for good.
    pub fn commit_identity(
        &self,
        req: &NewIdentity,
        now: Timestamp,
    ) -> Result<ProfileRecord, FlowError> {
        let channel = ChannelKey::new(ChannelType::Phone, req.channel_value.clone());
        match self.registry.create_identity(req, now) {
            Ok(profile) => {
                self.finish_flow(&channel, profile.id.to_string());
                Ok(profile)
            }
            Err(err) => {
                self.fail_flow(&channel, &err);
                Err(err.into())
            }
        }
    }

    /// Commit a tax-identifier flow against the profile's own channel.
    pub fn commit_tax_identifier(
        &self,
        identity: &IdentityId,
        now: Timestamp,
    ) -> Result<TaxRecord, FlowError> {
        let channel = self.registry.lookup_identity(identity)?.channel;
        match self.registry.issue_tax_identifier(identity, now) {
            Ok(record) => {
                self.finish_flow(&channel, record.id.to_string());
                Ok(record)
            }
            Err(err) => {
                self.fail_flow(&channel, &err);
                Err(err.into())
            }
        }
    }

    /// Commit an entity flow against the primary owner's channel.
    pub fn commit_entity(&self, req: &NewEntity, now: Timestamp) -> Result<EntityRecord, FlowError> {
        let channel = match req.owners.first() {
            Some(primary) => self.registry.lookup_identity(primary)?.channel,
            None => return Err(praman_registry::RegistryError::EmptyOwnerSet.into()),
        };
        match self.registry.register_entity(req, now) {
            Ok(record) => {
                self.finish_flow(&channel, record.id.to_string());
                Ok(record)
            }
            Err(err) => {
                self.fail_flow(&channel, &err);
                Err(err.into())
            }
        }
    }

    /// Drain pending events for the daemon to process.
    pub fn drain_events(&self) -> Vec<FlowEvent> {
        std::mem::take(&mut self.pending_events.lock().unwrap())
    }

    /// Drop finished flows and prune the underlying challenge store.
    pub fn prune(&self, now: Timestamp) -> usize {
        let pruned = self.challenges.prune_expired(now);
        self.flows.lock().unwrap().retain(|_, f| {
            !matches!(f.phase, FlowPhase::Committed | FlowPhase::Failed)
        });
        pruned
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            flows: self.flows.lock().unwrap().clone(),
        }
    }

    pub fn restore_flows(&self, snapshot: FlowSnapshot) {
        *self.flows.lock().unwrap() = snapshot.flows;
    }

    fn finish_flow(&self, channel: &ChannelKey, issued: String) {
        let mut flows = self.flows.lock().unwrap();
        if let Some(state) = flows.get_mut(channel) {
            state.phase = FlowPhase::Committed;
            self.push_event(FlowEvent::FlowCommitted {
                channel: channel.clone(),
                flow_type: state.flow_type,
                issued,
            });
        }
    }

    fn fail_flow(&self, channel: &ChannelKey, err: &praman_registry::RegistryError) {
        let mut flows = self.flows.lock().unwrap();
        if let Some(state) = flows.get_mut(channel) {
            state.phase = FlowPhase::Failed;
            self.push_event(FlowEvent::FlowFailed {
                channel: channel.clone(),
                flow_type: state.flow_type,
                reason: err.to_string(),
            });
        }
    }

    fn push_event(&self, event: FlowEvent) {
        self.pending_events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praman_store_memory::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records deliveries instead of sending them.
    #[derive(Default)]
    struct RecordingNotifier {
        delivered: AtomicUsize,
        last_code: Mutex<Option<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn deliver_code(&self, _channel: &ChannelKey, code: &str, _reference: &str) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            *self.last_code.lock().unwrap() = Some(code.to_string());
        }
    }

    fn setup() -> (FlowOrchestrator<MemoryStore>, Arc<RecordingNotifier>) {
        let params = CoreParams::issuance_defaults();
        let challenges = Arc::new(ChallengeStore::new(&params));
        let registry = Arc::new(Registry::new(
            Arc::new(MemoryStore::new()),
            Arc::clone(&challenges),
            params.clone(),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = FlowOrchestrator::new(
            registry,
            challenges,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            &params,
        );
        (orchestrator, notifier)
    }

    fn key() -> ChannelKey {
        ChannelKey::phone("9000000001")
    }

    fn delivered_code(notifier: &RecordingNotifier) -> String {
        notifier.last_code.lock().unwrap().clone().unwrap()
    }

    #[test]
    fn full_identity_flow_commits() {
        let (orchestrator, notifier) = setup();
        let now = Timestamp::new(1000);

        let started = orchestrator.start_flow(FlowType::Identity, &key(), now);
        assert!(started.reference.starts_with("ch_"));
        assert_eq!(notifier.delivered.load(Ordering::SeqCst), 1);

        orchestrator
            .submit_code(&key(), &delivered_code(&notifier), now)
            .unwrap();

        let profile = orchestrator
            .commit_identity(
                &NewIdentity {
                    name: "Ravi".into(),
                    channel_value: "9000000001".into(),
                    email: None,
                    address: None,
                },
                now,
            )
            .unwrap();
        assert_eq!(profile.id.as_str().len(), 12);

        let events = orchestrator.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], FlowEvent::FlowCommitted { .. }));
        // Drained means drained.
        assert!(orchestrator.drain_events().is_empty());
    }

    #[test]
    fn codes_are_never_revealed_with_issuance_defaults() {
        let (orchestrator, _) = setup();
        let started = orchestrator.start_flow(FlowType::Identity, &key(), Timestamp::new(1000));
        assert!(started.code.is_none());
    }

    #[test]
    fn dev_params_reveal_the_code() {
        let params = CoreParams::dev_defaults();
        let challenges = Arc::new(ChallengeStore::new(&params));
        let registry = Arc::new(Registry::new(
            Arc::new(MemoryStore::new()),
            Arc::clone(&challenges),
            params.clone(),
        ));
        let orchestrator = FlowOrchestrator::new(
            registry,
            challenges,
            Arc::new(RecordingNotifier::default()) as Arc<dyn Notifier>,
            &params,
        );
        let started = orchestrator.start_flow(FlowType::Identity, &key(), Timestamp::new(1000));
        assert!(started.code.is_some());
    }

    #[test]
    fn attempts_exhaust_into_failed_flow() {
        let (orchestrator, notifier) = setup();
        let now = Timestamp::new(1000);
        orchestrator.start_flow(FlowType::Identity, &key(), now);
        let code = delivered_code(&notifier);
        let wrong = if code == "111111" { "222222" } else { "111111" };

        for _ in 0..5 {
            assert!(orchestrator.submit_code(&key(), wrong, now).is_err());
        }
        // Even the right code is rejected now.
        let result = orchestrator.submit_code(&key(), &code, now);
        assert!(matches!(result, Err(FlowError::TooManyAttempts)));

        let events = orchestrator.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, FlowEvent::FlowFailed { .. })));
    }

    #[test]
    fn restart_recovers_a_failed_channel() {
        let (orchestrator, notifier) = setup();
        let now = Timestamp::new(1000);
        orchestrator.start_flow(FlowType::Identity, &key(), now);
        let code = delivered_code(&notifier);
        let wrong = if code == "111111" { "222222" } else { "111111" };
        for _ in 0..5 {
            let _ = orchestrator.submit_code(&key(), wrong, now);
        }

        orchestrator.start_flow(FlowType::Identity, &key(), now);
        let fresh = delivered_code(&notifier);
        assert!(orchestrator.submit_code(&key(), &fresh, now).is_ok());
    }

    #[test]
    fn submit_without_flow_fails() {
        let (orchestrator, _) = setup();
        let result = orchestrator.submit_code(&key(), "123456", Timestamp::new(1000));
        assert!(matches!(result, Err(FlowError::NoActiveFlow)));
    }

    #[test]
    fn failed_commit_fails_the_flow_for_good() {
        let (orchestrator, notifier) = setup();
        let now = Timestamp::new(1000);

        // Existing profile claims the channel.
        orchestrator.start_flow(FlowType::Identity, &key(), now);
        orchestrator
            .submit_code(&key(), &delivered_code(&notifier), now)
            .unwrap();
        let req = NewIdentity {
            name: "Ravi".into(),
            channel_value: "9000000001".into(),
            email: None,
            address: None,
        };
        orchestrator.commit_identity(&req, now).unwrap();

        // Second flow on the same channel verifies but cannot commit.
        orchestrator.start_flow(FlowType::Identity, &key(), now);
        orchestrator
            .submit_code(&key(), &delivered_code(&notifier), now)
            .unwrap();
        let result = orchestrator.commit_identity(&req, now);
        assert!(matches!(
            result,
            Err(FlowError::Registry(
                praman_registry::RegistryError::DuplicateChannel
            ))
        ));
        let events = orchestrator.drain_events();
        assert!(matches!(
            events.last(),
            Some(FlowEvent::FlowFailed { .. })
        ));
    }

    #[test]
    fn prune_drops_finished_flows() {
        let (orchestrator, notifier) = setup();
        let now = Timestamp::new(1000);
        orchestrator.start_flow(FlowType::Identity, &key(), now);
        orchestrator
            .submit_code(&key(), &delivered_code(&notifier), now)
            .unwrap();
        orchestrator
            .commit_identity(
                &NewIdentity {
                    name: "Ravi".into(),
                    channel_value: "9000000001".into(),
                    email: None,
                    address: None,
                },
                now,
            )
            .unwrap();

        orchestrator.prune(now);
        assert!(orchestrator.snapshot().flows.is_empty());
    }

    #[test]
    fn snapshot_round_trip_preserves_flows() {
        let (orchestrator, _) = setup();
        let now = Timestamp::new(1000);
        orchestrator.start_flow(FlowType::TaxIdentifier, &key(), now);

        let snapshot = orchestrator.snapshot();
        let (restored, _) = setup();
        restored.restore_flows(snapshot);
        // The flow exists again; a code submission reaches the challenge
        // layer instead of failing with NoActiveFlow.
        let result = restored.submit_code(&key(), "000000", now);
        assert!(matches!(
            result,
            Err(FlowError::Challenge(ChallengeError::Expired))
        ));
    }
}
