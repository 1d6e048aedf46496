//! Per-session conversation orchestration.
//!
//! One [`ChatSession`] owns everything a single conversation needs: the
//! booking flow, bounded chat memory, a rate limiter, and handles to the
//! collaborators (store, retriever, completion client). Sessions never
//! share mutable state; a [`SessionRegistry`] keys them by id for whatever
//! layer dispatches turns. Turns are strictly sequential within a session.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use medbook_core::config::{ClinicConfig, LimitsConfig};
use medbook_core::flows::BookingFlow;
use medbook_core::intent::{classify, Intent};
use medbook_core::notify::ConfirmationNotifier;
use medbook_core::store::BookingStore;
use medbook_core::validators::find_email;

use crate::llm::{ChatMessage, CompletionClient, CompletionRequest};
use crate::rate_limit::RateLimiter;
use crate::retrieval::DocumentRetriever;

/// Keep this many recent messages in session memory...
const MAX_MEMORY_MESSAGES: usize = 25;
/// ...and send this many to the completion client.
const LLM_HISTORY_MESSAGES: usize = 10;

/// Bookings shown per lookup reply.
const LOOKUP_LIMIT: usize = 5;

/// Everything needed to construct sessions. Collaborators are explicit
/// handles so tests substitute fakes per case.
#[derive(Clone)]
pub struct SessionDeps {
    pub store: Arc<dyn BookingStore>,
    pub notifier: Arc<dyn ConfirmationNotifier>,
    pub retriever: Arc<dyn DocumentRetriever>,
    pub completions: Arc<dyn CompletionClient>,
    pub clinic: ClinicConfig,
    pub limits: LimitsConfig,
}

pub struct ChatSession {
    flow: BookingFlow,
    store: Arc<dyn BookingStore>,
    retriever: Arc<dyn DocumentRetriever>,
    completions: Arc<dyn CompletionClient>,
    limiter: RateLimiter,
    clinic: ClinicConfig,
    memory: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(deps: &SessionDeps) -> Self {
        Self {
            flow: BookingFlow::new(deps.store.clone(), deps.notifier.clone()),
            store: deps.store.clone(),
            retriever: deps.retriever.clone(),
            completions: deps.completions.clone(),
            limiter: RateLimiter::new(&deps.limits),
            clinic: deps.clinic.clone(),
            memory: Vec::new(),
        }
    }

    /// Process one user turn and produce the assistant reply. Exactly one
    /// state transition happens per call.
    pub async fn process_turn(&mut self, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return "I didn't catch that. Could you please repeat?".to_string();
        }

        if let Err(refusal) = self.limiter.check_message() {
            return refusal;
        }
        self.limiter.record_message();

        self.remember(ChatMessage::user(message));

        let intent = classify(message, self.flow.is_active());
        info!(?intent, booking_active = self.flow.is_active(), "routing turn");

        let reply = match intent {
            Intent::Greeting => self.greeting_reply(),
            Intent::Help => help_reply().to_string(),
            Intent::Booking | Intent::BookingEdit => self.handle_booking(message).await,
            Intent::Lookup => self.handle_lookup(message).await,
            Intent::General => self.handle_general(message).await,
        };

        self.remember(ChatMessage::assistant(reply.clone()));
        reply
    }

    /// Whether a booking flow is mid-conversation.
    pub fn is_active(&self) -> bool {
        self.flow.is_active()
    }

    /// Abandon any in-progress booking (e.g. from a UI cancel control).
    pub fn reset(&mut self) {
        self.flow.reset();
    }

    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    /// Short progress line for UI display.
    pub fn status_summary(&self) -> String {
        self.flow.status_message()
    }

    fn remember(&mut self, message: ChatMessage) {
        self.memory.push(message);
        if self.memory.len() > MAX_MEMORY_MESSAGES {
            let excess = self.memory.len() - MAX_MEMORY_MESSAGES;
            self.memory.drain(..excess);
        }
    }

    async fn handle_booking(&mut self, message: &str) -> String {
        if !self.flow.is_active() {
            if let Err(refusal) = self.limiter.check_booking() {
                return refusal;
            }
            self.limiter.record_booking();
            return self.flow.start();
        }

        self.flow.handle_input(message).await.reply
    }

    async fn handle_lookup(&mut self, message: &str) -> String {
        let Some(email) = find_email(message) else {
            return "To look up your appointments, please provide your email address.\n\n\
                    For example: 'Check my appointments for john@example.com'"
                .to_string();
        };

        let bookings = match self.store.bookings_by_email(&email).await {
            Ok(bookings) => bookings,
            Err(store_error) => {
                error!(error = %store_error, "booking lookup failed");
                return "I'm having trouble accessing the booking system. Please try again later."
                    .to_string();
            }
        };

        if bookings.is_empty() {
            return format!(
                "I couldn't find any appointments for {email}. Would you like to schedule a \
                 new appointment?"
            );
        }

        let mut reply = format!("Your appointments ({email}):\n");
        for booking in bookings.iter().take(LOOKUP_LIMIT) {
            reply.push_str(&format!(
                "\n#{} - {}\n    {} at {} ({})",
                booking.id.0,
                booking.booking_type,
                booking.date,
                booking.time,
                booking.status.as_str()
            ));
        }
        reply
    }

    async fn handle_general(&mut self, message: &str) -> String {
        let retrieved = match self.retriever.query(message).await {
            Ok(retrieved) => retrieved,
            Err(retrieval_error) => {
                error!(error = %retrieval_error, "document retrieval failed");
                Default::default()
            }
        };

        let history_start = self.memory.len().saturating_sub(LLM_HISTORY_MESSAGES);
        let request = CompletionRequest {
            system_prompt: self.system_prompt(),
            history: self.memory[history_start..].to_vec(),
            user_message: message.to_string(),
            document_context: retrieved.context.clone(),
        };

        match self.completions.complete(&request).await {
            Ok(mut reply) => {
                if retrieved.context.is_some() && !retrieved.sources.is_empty() {
                    reply.push_str(&format!("\n\nSource: {}", retrieved.sources.join(", ")));
                }
                reply
            }
            Err(completion_error) => {
                error!(error = %completion_error, "completion failed");
                "I apologize, but I'm having trouble processing your request right now. \
                 Please try again in a moment."
                    .to_string()
            }
        }
    }

    fn greeting_reply(&self) -> String {
        format!(
            "Hello! Welcome to {}'s booking assistant.\n\n\
             I can help you with:\n\
             - Schedule an appointment - just say \"I want to book an appointment\"\n\
             - Answer questions - ask me anything about our services\n\
             - Look up your bookings - say \"check my appointments\"\n\n\
             How can I assist you today?",
            self.clinic.name
        )
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a friendly and professional medical appointment booking assistant for {name}.\n\n\
             Key information about the clinic:\n\
             - Name: {name}\n\
             - Address: {address}\n\
             - Phone: {phone}\n\
             - Hours: Monday-Friday 8:00 AM - 6:00 PM\n\n\
             When document context is provided, treat it as authoritative and answer from it. \
             Be concise, warm, and honest when you don't know something. Booking requests are \
             handled by a separate flow, not by you.",
            name = self.clinic.name,
            address = self.clinic.address,
            phone = self.clinic.phone,
        )
    }
}

fn help_reply() -> &'static str {
    "Here's what I can help you with:\n\n\
     Book an appointment - say something like:\n\
     - \"I want to schedule an appointment\"\n\
     - \"Book a checkup for tomorrow\"\n\n\
     Ask questions - if clinic documents have been uploaded, I can answer questions about \
     services, policies, and insurance.\n\n\
     Look up bookings - say \"check my appointments\" and include your email address.\n\n\
     What would you like to do?"
}

/// Owns every live session, keyed by conversation id. The dispatching layer
/// must route a given session's turns sequentially; distinct sessions are
/// fully independent.
pub struct SessionRegistry {
    deps: SessionDeps,
    sessions: HashMap<String, ChatSession>,
}

impl SessionRegistry {
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps, sessions: HashMap::new() }
    }

    pub fn session(&mut self, session_id: &str) -> &mut ChatSession {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ChatSession::new(&self.deps))
    }

    pub fn remove(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use medbook_core::config::{ClinicConfig, LimitsConfig};
    use medbook_core::domain::booking::{Booking, BookingId, BookingStatus, NewBooking};
    use medbook_core::domain::customer::{Customer, CustomerId, NewCustomer};
    use medbook_core::notify::{BookingConfirmation, ConfirmationNotifier, DeliveryOutcome};
    use medbook_core::store::{BookingStore, StoreError};

    use crate::llm::{CompletionClient, ScriptedCompletionClient};
    use crate::retrieval::{DocumentRetriever, NoopRetriever, RetrievedContext};

    use super::{ChatSession, SessionDeps, SessionRegistry};

    #[derive(Default)]
    struct FakeStore {
        bookings: Mutex<Vec<Booking>>,
    }

    impl FakeStore {
        fn with_booking(booking: Booking) -> Self {
            Self { bookings: Mutex::new(vec![booking]) }
        }
    }

    #[async_trait]
    impl BookingStore for FakeStore {
        async fn get_or_create_customer(
            &self,
            customer: NewCustomer,
        ) -> Result<(Customer, bool), StoreError> {
            Ok((
                Customer {
                    id: CustomerId(1),
                    name: customer.name,
                    email: customer.email,
                    phone: customer.phone,
                    created_at: None,
                },
                true,
            ))
        }

        async fn create_booking(&self, booking: NewBooking) -> Result<Booking, StoreError> {
            let record = Booking {
                id: BookingId(42),
                customer_id: booking.customer_id,
                booking_type: booking.booking_type,
                date: booking.date,
                time: booking.time,
                status: BookingStatus::Confirmed,
                notes: booking.notes,
                created_at: None,
            };
            self.bookings.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
            let _ = email;
            Ok(self.bookings.lock().unwrap().clone())
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl ConfirmationNotifier for SilentNotifier {
        async fn send_booking_confirmation(
            &self,
            _confirmation: &BookingConfirmation,
        ) -> DeliveryOutcome {
            DeliveryOutcome::delivered()
        }
    }

    struct ScriptedRetriever {
        context: String,
        sources: Vec<String>,
    }

    #[async_trait]
    impl DocumentRetriever for ScriptedRetriever {
        async fn query(&self, _question: &str) -> Result<RetrievedContext> {
            Ok(RetrievedContext {
                context: Some(self.context.clone()),
                sources: self.sources.clone(),
            })
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl DocumentRetriever for FailingRetriever {
        async fn query(&self, _question: &str) -> Result<RetrievedContext> {
            Err(anyhow!("vector store offline"))
        }
    }

    fn deps_with(
        store: Arc<dyn BookingStore>,
        retriever: Arc<dyn DocumentRetriever>,
        completions: Arc<dyn CompletionClient>,
    ) -> SessionDeps {
        SessionDeps {
            store,
            notifier: Arc::new(SilentNotifier),
            retriever,
            completions,
            clinic: ClinicConfig {
                name: "HealthFirst Medical Center".to_string(),
                phone: "+1-555-0123".to_string(),
                address: "123 Health Street, Medical City".to_string(),
            },
            limits: LimitsConfig {
                max_messages_per_minute: 100,
                max_bookings_per_hour: 5,
                // tests drive many turns back-to-back
                cooldown_secs: 0,
            },
        }
    }

    fn default_deps() -> SessionDeps {
        deps_with(
            Arc::new(FakeStore::default()),
            Arc::new(NoopRetriever),
            Arc::new(ScriptedCompletionClient::replying("Our hours are 8am to 6pm.")),
        )
    }

    #[tokio::test]
    async fn empty_input_asks_for_a_repeat() {
        let mut session = ChatSession::new(&default_deps());
        let reply = session.process_turn("   ").await;
        assert!(reply.contains("didn't catch that"));
    }

    #[tokio::test]
    async fn greeting_mentions_the_clinic() {
        let mut session = ChatSession::new(&default_deps());
        let reply = session.process_turn("hello").await;
        assert!(reply.contains("HealthFirst Medical Center"));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn booking_trigger_starts_the_flow_and_stays_active() {
        let mut session = ChatSession::new(&default_deps());
        let reply = session.process_turn("I want to book an appointment").await;
        assert!(reply.contains("full name"));
        assert!(session.is_active());
        assert_eq!(session.status_summary(), "Collecting booking info (0/6 fields)");

        // mid-flow, help keywords still feed the flow (here: the name field)
        let reply = session.process_turn("what can you do").await;
        assert!(!reply.contains("Here's what I can help you with"));
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn full_booking_conversation_reaches_completion() {
        let store = Arc::new(FakeStore::default());
        let mut session = ChatSession::new(&deps_with(
            store.clone(),
            Arc::new(NoopRetriever),
            Arc::new(ScriptedCompletionClient::failing()),
        ));

        session.process_turn("book an appointment please").await;
        for value in ["ada lovelace", "ada@example.com", "555 123 4567", "dental", "tomorrow"] {
            session.process_turn(value).await;
        }
        let confirmation = session.process_turn("2pm").await;
        assert!(confirmation.contains("Please confirm"));

        let done = session.process_turn("yes").await;
        assert!(done.contains("Booking ID: #42"));
        assert!(!session.is_active());
        assert_eq!(store.bookings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_abandons_an_active_flow() {
        let mut session = ChatSession::new(&default_deps());
        session.process_turn("book an appointment").await;
        assert!(session.is_active());

        session.reset();
        assert!(!session.is_active());
        assert_eq!(session.status_summary(), "");
    }

    #[tokio::test]
    async fn lookup_requires_an_email_address() {
        let mut session = ChatSession::new(&default_deps());
        let reply = session.process_turn("check my appointments").await;
        assert!(reply.contains("provide your email address"));
    }

    #[tokio::test]
    async fn lookup_lists_existing_bookings() {
        let booking = Booking {
            id: BookingId(7),
            customer_id: CustomerId(1),
            booking_type: "Lab Tests".to_string(),
            date: "2026-09-15".to_string(),
            time: "09:00".to_string(),
            status: BookingStatus::Confirmed,
            notes: None,
            created_at: None,
        };
        let mut session = ChatSession::new(&deps_with(
            Arc::new(FakeStore::with_booking(booking)),
            Arc::new(NoopRetriever),
            Arc::new(ScriptedCompletionClient::failing()),
        ));

        let reply = session.process_turn("check my appointments for ada@example.com").await;
        assert!(reply.contains("#7 - Lab Tests"));
        assert!(reply.contains("2026-09-15 at 09:00"));
        assert!(reply.contains("CONFIRMED"));
    }

    #[tokio::test]
    async fn general_questions_get_completion_with_source_attribution() {
        let mut session = ChatSession::new(&deps_with(
            Arc::new(FakeStore::default()),
            Arc::new(ScriptedRetriever {
                context: "The clinic accepts most insurance plans.".to_string(),
                sources: vec!["policies.pdf".to_string()],
            }),
            Arc::new(ScriptedCompletionClient::replying("Most plans are accepted.")),
        ));

        let reply = session.process_turn("do you take insurance?").await;
        assert!(reply.contains("Most plans are accepted."));
        assert!(reply.contains("Source: policies.pdf"));
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_plain_completion() {
        let mut session = ChatSession::new(&deps_with(
            Arc::new(FakeStore::default()),
            Arc::new(FailingRetriever),
            Arc::new(ScriptedCompletionClient::replying("Happy to help.")),
        ));

        let reply = session.process_turn("tell me about the clinic").await;
        assert_eq!(reply, "Happy to help.");
    }

    #[tokio::test]
    async fn completion_failure_produces_an_apology() {
        let mut session = ChatSession::new(&deps_with(
            Arc::new(FakeStore::default()),
            Arc::new(NoopRetriever),
            Arc::new(ScriptedCompletionClient::failing()),
        ));

        let reply = session.process_turn("tell me about the clinic").await;
        assert!(reply.contains("having trouble processing"));
    }

    #[tokio::test]
    async fn booking_starts_are_rate_limited() {
        let mut deps = default_deps();
        deps.limits.max_bookings_per_hour = 1;
        let mut session = ChatSession::new(&deps);

        session.process_turn("book an appointment").await;
        session.reset();

        let refusal = session.process_turn("book an appointment").await;
        assert!(refusal.contains("too many booking attempts"));
    }

    #[tokio::test]
    async fn registry_isolates_sessions() {
        let mut registry = SessionRegistry::new(default_deps());

        registry.session("alice").process_turn("book an appointment").await;
        assert!(registry.session("alice").is_active());
        assert!(!registry.session("bob").is_active());
        assert_eq!(registry.len(), 2);

        registry.remove("alice");
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
